//! Noise removal driven by an ordered rule table.
//!
//! Each [`NoiseRule`] pairs a [`Predicate`] (when the rule applies) with an
//! [`Action`] (what it removes). Chrome rules always run, tracking rules run
//! when `remove_tracking` is set, and site rules run when `site_rules` is set
//! and the base URL matches. Markup actions rewrite the raw HTML before it is
//! parsed; every other action removes elements from the tree.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::ConvertConfig;
use crate::dom::{Element, Node, TagKind};

static HIDDEN_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(display\s*:\s*none|visibility\s*:\s*hidden)").expect("HIDDEN_STYLE regex"));

static TRACKING_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(ads?|advert\w*|ad[-_].+|.+[-_]ads?|sponsor(ed)?([-_].*)?|tracking([-_].*)?|.+[-_]tracking|tracker|pixel|beacon|analytics([-_].*)?|newsletter([-_].*)?|.+[-_]newsletter|social[-_]?share.*|share[-_]?(bar|buttons?|tools|links)|cookies?([-_].*)?|.+[-_]cookies?|consent([-_].*)?|gdpr([-_].*)?|outbrain.*|taboola.*|related[-_]?(articles?|stories|posts|content|links)|paywall([-_].*)?|subscribe[-_].+)$",
    )
    .expect("TRACKING_NAME regex")
});

static CONDITIONAL_COMMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!--\[if[^\]]*\]>.*?<!\[endif\]-->|<!--<!\[if[^\]]*\]>.*?<!\[endif\]-->")
        .expect("CONDITIONAL_COMMENTS regex")
});

static INFOQ_CHROME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(masthead.*|header__.+|article__header.*|article__data|authors?([-_].*)?|.+[-_]authors?|bio|.+[-_]bio|byline.*|.+[-_]byline|contributors?|rightbar.*|sidebar.*|topics|article__topics|tag-list|ratings?|widget.*|login.*|legal.*|.+[-_]legal|disclaimer|copyright.*)$",
    )
    .expect("INFOQ_CHROME regex")
});

/// Which toggle governs a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Page chrome. Always on.
    Chrome,
    /// Generic tracking and advertising noise.
    Tracking,
    /// Deep clean for one publisher.
    Site,
}

/// When a rule applies.
#[derive(Debug, Clone, Copy)]
pub enum Predicate {
    Always,
    BaseUrlContains(&'static str),
}

impl Predicate {
    fn matches(&self, base_url: Option<&str>) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::BaseUrlContains(needle) => {
                base_url.is_some_and(|url| url.to_ascii_lowercase().contains(needle))
            }
        }
    }
}

/// What a rule removes.
#[derive(Debug, Clone, Copy)]
pub enum Action {
    /// Regex over the raw markup, applied before parsing.
    StripMarkup(&'static LazyLock<Regex>),
    /// Elements with one of these tag names.
    RemoveTags(&'static [&'static str]),
    /// Elements whose id or any class token matches.
    RemoveClassOrId(&'static LazyLock<Regex>),
    /// `hidden`, `aria-hidden="true"` and inline-hidden elements.
    RemoveHidden,
    /// Images declared at most 1x1 pixels.
    RemoveTrackingPixels,
}

impl Action {
    fn matches(&self, el: &Element) -> bool {
        match self {
            Action::StripMarkup(_) => false,
            Action::RemoveTags(tags) => tags.contains(&el.name.as_str()),
            Action::RemoveClassOrId(pattern) => {
                el.id().is_some_and(|id| pattern.is_match(id)) || el.classes().any(|class| pattern.is_match(class))
            }
            Action::RemoveHidden => {
                el.attr("hidden").is_some()
                    || el.attr("aria-hidden").is_some_and(|value| value.trim().eq_ignore_ascii_case("true"))
                    || el.attr("style").is_some_and(|style| HIDDEN_STYLE.is_match(style))
            }
            Action::RemoveTrackingPixels => el.kind == TagKind::Image && is_tracking_pixel(el),
        }
    }
}

/// One `(predicate, action)` entry of the rule table.
#[derive(Debug)]
pub struct NoiseRule {
    pub name: &'static str,
    pub kind: RuleKind,
    pub applies: Predicate,
    pub action: Action,
}

/// The rule table, in evaluation order.
pub static NOISE_RULES: [NoiseRule; 7] = [
    NoiseRule {
        name: "chrome-tags",
        kind: RuleKind::Chrome,
        applies: Predicate::Always,
        action: Action::RemoveTags(&[
            "nav", "footer", "aside", "button", "input", "select", "textarea", "dialog",
        ]),
    },
    NoiseRule { name: "hidden", kind: RuleKind::Chrome, applies: Predicate::Always, action: Action::RemoveHidden },
    NoiseRule {
        name: "tracking-names",
        kind: RuleKind::Tracking,
        applies: Predicate::Always,
        action: Action::RemoveClassOrId(&TRACKING_NAME),
    },
    NoiseRule {
        name: "tracking-pixels",
        kind: RuleKind::Tracking,
        applies: Predicate::Always,
        action: Action::RemoveTrackingPixels,
    },
    NoiseRule {
        name: "infoq-conditional-comments",
        kind: RuleKind::Site,
        applies: Predicate::BaseUrlContains("infoq.com"),
        action: Action::StripMarkup(&CONDITIONAL_COMMENTS),
    },
    NoiseRule {
        name: "infoq-chrome",
        kind: RuleKind::Site,
        applies: Predicate::BaseUrlContains("infoq.com"),
        action: Action::RemoveClassOrId(&INFOQ_CHROME),
    },
    NoiseRule {
        name: "infoq-masthead-tags",
        kind: RuleKind::Site,
        applies: Predicate::BaseUrlContains("infoq.com"),
        action: Action::RemoveTags(&["header"]),
    },
];

/// Selects the rules that apply to one document, in table order.
pub fn active_rules(base_url: Option<&str>, config: &ConvertConfig) -> Vec<&'static NoiseRule> {
    NOISE_RULES
        .iter()
        .filter(|rule| match rule.kind {
            RuleKind::Chrome => true,
            RuleKind::Tracking => config.remove_tracking,
            RuleKind::Site => config.site_rules,
        })
        .filter(|rule| rule.applies.matches(base_url))
        .collect()
}

/// Applies the markup actions of `rules` to raw HTML.
pub fn apply_markup_rules(html: &str, rules: &[&NoiseRule]) -> String {
    let mut result = html.to_string();
    for rule in rules {
        if let Action::StripMarkup(pattern) = rule.action
            && pattern.is_match(&result)
        {
            result = pattern.replace_all(&result, "").into_owned();
            tracing::debug!(rule = rule.name, "stripped markup");
        }
    }
    result
}

/// Removes every element matched by a tree action of `rules`.
///
/// Returns the number of elements removed per rule name.
pub fn clean_tree(nodes: &mut Vec<Node>, rules: &[&NoiseRule]) -> BTreeMap<&'static str, usize> {
    let mut removed = BTreeMap::new();
    clean_nodes(nodes, rules, &mut removed);

    if !removed.is_empty() {
        tracing::debug!(?removed, "noise removal finished");
    }
    removed
}

fn clean_nodes(nodes: &mut Vec<Node>, rules: &[&NoiseRule], removed: &mut BTreeMap<&'static str, usize>) {
    nodes.retain_mut(|node| {
        let Node::Element(el) = node else {
            return true;
        };

        if let Some(rule) = rules.iter().find(|rule| rule.action.matches(el)) {
            *removed.entry(rule.name).or_insert(0) += 1;
            return false;
        }

        clean_nodes(&mut el.children, rules, removed);
        true
    });
}

fn is_tracking_pixel(el: &Element) -> bool {
    let dimension = |name: &str| {
        el.attr(name)
            .map(|value| value.trim().trim_end_matches("px").trim())
            .and_then(|value| value.parse::<f32>().ok())
    };

    matches!((dimension("width"), dimension("height")), (Some(w), Some(h)) if w <= 1.0 && h <= 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Document;

    fn cleaned(html: &str, base_url: Option<&str>, config: &ConvertConfig) -> Vec<Node> {
        let rules = active_rules(base_url, config);
        let markup = apply_markup_rules(html, &rules);
        let mut doc = Document::parse(&markup).unwrap();
        clean_tree(doc.nodes_mut(), &rules);
        doc.into_nodes()
    }

    fn text_of(nodes: &[Node]) -> String {
        let wrapper = Element::new("div", Vec::new(), nodes.to_vec());
        wrapper.collapsed_text()
    }

    #[test]
    fn test_chrome_tags_removed() {
        let html = r#"
            <nav><a href="/">Home</a></nav>
            <aside>Trending now</aside>
            <p>Story text</p>
            <footer>Copyright</footer>
        "#;
        let text = text_of(&cleaned(html, None, &ConvertConfig::default()));
        assert_eq!(text, "Story text");
    }

    #[test]
    fn test_form_wrapper_keeps_content() {
        let html = r#"
            <form id="aspnetForm" method="post">
              <input type="hidden" name="__VIEWSTATE" value="abc">
              <h1>Headline</h1>
              <p>Body of the story.</p>
              <button type="submit">Search</button>
            </form>
        "#;
        let text = text_of(&cleaned(html, None, &ConvertConfig::default()));
        assert_eq!(text, "Headline Body of the story.");
    }

    #[test]
    fn test_hidden_elements_removed() {
        let html = r#"
            <div style="display: none">Hidden content</div>
            <div hidden>Also hidden</div>
            <span aria-hidden="true">Icon</span>
            <p>Visible content</p>
        "#;
        let text = text_of(&cleaned(html, None, &ConvertConfig::default()));
        assert_eq!(text, "Visible content");
    }

    #[test]
    fn test_tracking_names_removed() {
        let html = r#"
            <div class="story ad-slot">Buy now</div>
            <div id="taboola-below-article">Sponsored links</div>
            <div class="newsletter-signup">Sign up</div>
            <div class="social-share">Share</div>
            <div class="header shadow loaded">Kept</div>
        "#;
        let text = text_of(&cleaned(html, None, &ConvertConfig::default()));
        assert_eq!(text, "Kept");
    }

    #[test]
    fn test_tracking_rules_can_be_disabled() {
        let html = r#"<div class="ad-slot">Buy now</div><p>Story</p>"#;
        let config = ConvertConfig::builder().remove_tracking(false).build();
        let text = text_of(&cleaned(html, None, &config));
        assert!(text.contains("Buy now"));
    }

    #[test]
    fn test_tracking_pixel_removed() {
        let html = r#"<p>Text<img src="https://t.example.com/p.gif" width="1" height="1"><img src="a.jpg" width="640" height="1"></p>"#;
        let nodes = cleaned(html, None, &ConvertConfig::default());
        let p = nodes.iter().find_map(Node::as_element).unwrap();
        let images: Vec<_> = p
            .children
            .iter()
            .filter_map(Node::as_element)
            .filter(|el| el.kind == TagKind::Image)
            .collect();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].attr("src"), Some("a.jpg"));
    }

    #[test]
    fn test_site_rules_only_for_matching_base() {
        let html = r#"
            <header class="article__header">Masthead</header>
            <div class="author-section-full">About the author</div>
            <p>Article body</p>
        "#;

        let infoq = text_of(&cleaned(html, Some("https://www.infoq.com/articles/x/"), &ConvertConfig::default()));
        assert_eq!(infoq, "Article body");

        let other = text_of(&cleaned(html, Some("https://example.com/x"), &ConvertConfig::default()));
        assert!(other.contains("Masthead"));
        assert!(other.contains("About the author"));
    }

    #[test]
    fn test_site_rules_can_be_disabled() {
        let html = r#"<div class="byline">By Someone</div><p>Body</p>"#;
        let config = ConvertConfig::builder().site_rules(false).build();
        let text = text_of(&cleaned(html, Some("https://www.infoq.com/news/"), &config));
        assert!(text.contains("By Someone"));
    }

    #[test]
    fn test_conditional_comment_blocks_stripped() {
        let html = r#"<p>Before</p><!--[if !IE]><!--><p>Legal notice</p><!--<![endif]--><!--[if lt IE 9]><p>Old browser</p><![endif]--><p>After</p>"#;
        let rules = active_rules(Some("https://www.infoq.com/news/"), &ConvertConfig::default());
        let result = apply_markup_rules(html, &rules);
        assert_eq!(result, "<p>Before</p><p>After</p>");
    }

    #[test]
    fn test_active_rules_order() {
        let rules = active_rules(Some("https://infoq.com"), &ConvertConfig::default());
        let names: Vec<_> = rules.iter().map(|rule| rule.name).collect();
        assert_eq!(names.first(), Some(&"chrome-tags"));
        assert_eq!(names.last(), Some(&"infoq-masthead-tags"));
        assert_eq!(names.len(), NOISE_RULES.len());
    }

    #[test]
    fn test_clean_tree_reports_counts() {
        let mut doc = Document::parse("<nav>a</nav><nav>b</nav><div class='ads'>c</div>").unwrap();
        let rules = active_rules(None, &ConvertConfig::default());
        let removed = clean_tree(doc.nodes_mut(), &rules);
        assert_eq!(removed.get("chrome-tags"), Some(&2));
        assert_eq!(removed.get("tracking-names"), Some(&1));
    }
}
