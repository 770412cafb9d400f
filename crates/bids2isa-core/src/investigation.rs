//! Investigation document: a fixed template with two placeholders.

pub const TITLE_PLACEHOLDER: &str = "[TODO: TITLE]";
pub const PARAMETER_NAMES_PLACEHOLDER: &str = "[TODO: MRI_PAR_NAMES]";

pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/i_investigation_template.txt");

/// Substitute both placeholders in one left-to-right pass. Inserted text is
/// never rescanned and everything else is copied byte for byte.
pub fn render_investigation(template: &str, title: &str, parameter_names: &[String]) -> String {
    let names = parameter_names.join(";");
    let placeholders = [
        (TITLE_PLACEHOLDER, title),
        (PARAMETER_NAMES_PLACEHOLDER, names.as_str()),
    ];

    let mut out = String::with_capacity(template.len() + title.len() + names.len());
    let mut rest = template;
    loop {
        let next = placeholders
            .iter()
            .filter_map(|(needle, value)| rest.find(needle).map(|idx| (idx, *needle, *value)))
            .min_by_key(|(idx, _, _)| *idx);
        match next {
            Some((idx, needle, value)) => {
                out.push_str(&rest[..idx]);
                out.push_str(value);
                rest = &rest[idx + needle.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_title_and_names() {
        let out = render_investigation(
            "T=[TODO: TITLE]\tP=[TODO: MRI_PAR_NAMES]\n[TODO: TITLE]",
            "My Study",
            &["resolution".into(), "flip angle".into()],
        );
        assert_eq!(out, "T=My Study\tP=resolution;flip angle\nMy Study");
    }

    #[test]
    fn inserted_text_is_not_rescanned() {
        let out = render_investigation(
            "[TODO: TITLE]|[TODO: MRI_PAR_NAMES]",
            "[TODO: MRI_PAR_NAMES]",
            &[],
        );
        assert_eq!(out, "[TODO: MRI_PAR_NAMES]|");
    }

    #[test]
    fn default_template_is_otherwise_untouched() {
        let out = render_investigation(DEFAULT_TEMPLATE, "X", &["a".into()]);
        let expected = DEFAULT_TEMPLATE
            .replace(TITLE_PLACEHOLDER, "X")
            .replace(PARAMETER_NAMES_PLACEHOLDER, "a");
        assert_eq!(out, expected);
        assert!(out.contains("Study Title\t\"X\""));
    }
}
