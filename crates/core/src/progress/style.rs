use std::fmt::Write as _;

use super::time::parse_leading_int;
use crate::widget::Attributes;

const DEFAULT_DOT_DIAMETER: i64 = 25;

/// Part of the bar a declaration applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleSection {
    Container,
    EmptyBar,
    Progress,
    Dot,
}

impl StyleSection {
    fn selector(self) -> &'static str {
        match self {
            Self::Container => "#container",
            Self::EmptyBar => "#emptyBar",
            Self::Progress => "#progressBar",
            Self::Dot => "#progressBar::after",
        }
    }
}

/// One resolved declaration together with the option that controls it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    pub option: &'static str,
    pub property: &'static str,
    pub value: String,
    pub section: StyleSection,
}

/// (option, property, default, section)
const RULES: &[(&str, &str, &str, StyleSection)] = &[
    ("text-color", "color", "#FFF", StyleSection::Container),
    ("background-color", "background-color", "#AAA", StyleSection::EmptyBar),
    ("border-width", "border-width", "0", StyleSection::EmptyBar),
    ("border-style", "border-style", "none", StyleSection::EmptyBar),
    ("border-radius", "border-radius", "10px", StyleSection::EmptyBar),
    ("border-color", "border-color", "#0000", StyleSection::EmptyBar),
    ("width", "width", "500px", StyleSection::EmptyBar),
    ("height", "height", "20px", StyleSection::EmptyBar),
    ("progress-color", "background-color", "#0000", StyleSection::Progress),
    ("border-radius", "border-radius", "10px", StyleSection::Progress),
    ("progress-color", "border-color", "#0C0", StyleSection::Progress),
    ("height", "height", "20px", StyleSection::Progress),
    ("dot-color", "background-color", "#0F0", StyleSection::Dot),
    ("dot-diameter", "width", "25px", StyleSection::Dot),
    ("dot-diameter", "height", "25px", StyleSection::Dot),
];

/// Style of the progress bar, resolved once from attribute overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarStyleRules {
    rules: Vec<StyleRule>,
    dot_offset: String,
}

impl BarStyleRules {
    /// Resolves every rule from its attribute, falling back to the default
    /// when the attribute is absent or empty.
    pub fn from_attributes(attributes: &Attributes) -> Self {
        let rules = RULES
            .iter()
            .map(|&(option, property, default, section)| StyleRule {
                option,
                property,
                value: attributes
                    .get(option)
                    .filter(|value| !value.is_empty())
                    .unwrap_or(default)
                    .to_string(),
                section,
            })
            .collect();

        let diameter = attributes
            .get("dot-diameter")
            .and_then(parse_leading_int)
            .filter(|diameter| *diameter != 0)
            .unwrap_or(DEFAULT_DOT_DIAMETER);

        Self {
            rules,
            dot_offset: format!("-{}px", diameter as f64 / 2.0),
        }
    }

    /// Returns the resolved rules in declaration order.
    pub fn rules(&self) -> &[StyleRule] {
        &self.rules
    }

    /// Value of `property` within `section`.
    pub fn value(&self, section: StyleSection, property: &str) -> Option<&str> {
        if section == StyleSection::Dot && property == "right" {
            return Some(&self.dot_offset);
        }
        self.rules
            .iter()
            .find(|rule| rule.section == section && rule.property == property)
            .map(|rule| rule.value.as_str())
    }

    /// Renders the rules as a style sheet with one block per section.
    pub fn to_css(&self) -> String {
        let mut css = String::new();
        for section in [
            StyleSection::Container,
            StyleSection::EmptyBar,
            StyleSection::Progress,
            StyleSection::Dot,
        ] {
            let mut declarations: Vec<String> = self
                .rules
                .iter()
                .filter(|rule| rule.section == section)
                .map(|rule| format!("{}: {}", rule.property, rule.value))
                .collect();
            if section == StyleSection::Dot {
                declarations.push(format!("right: {}", self.dot_offset));
            }

            if !css.is_empty() {
                css.push('\n');
            }
            let _ = write!(
                css,
                "{} {{\n\t{};\n}}",
                section.selector(),
                declarations.join(";\n\t")
            );
        }
        css
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_overrides() {
        let style = BarStyleRules::from_attributes(&Attributes::new());

        assert_eq!(style.rules().len(), 15);
        assert_eq!(style.value(StyleSection::EmptyBar, "width"), Some("500px"));
        assert_eq!(style.value(StyleSection::Progress, "border-color"), Some("#0C0"));
        assert_eq!(style.value(StyleSection::Dot, "right"), Some("-12.5px"));
    }

    #[test]
    fn one_option_can_drive_several_declarations() {
        let attributes: Attributes = [("dot-diameter", "30px"), ("progress-color", "#123")]
            .into_iter()
            .collect();
        let style = BarStyleRules::from_attributes(&attributes);

        assert_eq!(style.value(StyleSection::Dot, "width"), Some("30px"));
        assert_eq!(style.value(StyleSection::Dot, "height"), Some("30px"));
        assert_eq!(style.value(StyleSection::Dot, "right"), Some("-15px"));
        assert_eq!(style.value(StyleSection::Progress, "background-color"), Some("#123"));
        assert_eq!(style.value(StyleSection::Progress, "border-color"), Some("#123"));
    }

    #[test]
    fn renders_one_block_per_section() {
        let css = BarStyleRules::from_attributes(&Attributes::new()).to_css();

        assert!(css.starts_with("#container {\n\tcolor: #FFF;\n}"));
        assert!(css.contains("\n#emptyBar {\n\tbackground-color: #AAA;\n\tborder-width: 0;"));
        assert!(css.ends_with("right: -12.5px;\n}"));
    }
}
