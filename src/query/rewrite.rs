use lazy_static::lazy_static;
use regex::{NoExpand, Regex};

lazy_static! {
    // An exact matcher whose quoted value starts with one or more `$`.
    static ref TEMPLATE_MATCHER: Regex =
        Regex::new(r#"="\$+[^"]+""#).expect("template matcher pattern is valid");
}

const MATCH_ANYTHING: &str = r#"=~".*""#;

/// Turns dashboard template placeholders such as `host="$host"` into
/// `host=~".*"` so the expression can run outside a dashboard.
///
/// This is a textual rewrite; the query language is not parsed.
pub fn rewrite(expr: &str) -> String {
    if !expr.contains('$') {
        return expr.to_string();
    }
    TEMPLATE_MATCHER
        .replace_all(expr, NoExpand(MATCH_ANYTHING))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn leaves_plain_expressions_alone() {
        let expr = r#"sum(rate(http_requests_total{job="api"}[5m])) by (instance)"#;
        assert_eq!(rewrite(expr), expr);
    }

    #[test]
    fn replaces_every_placeholder() {
        let expr = r#"node_load1{instance="$instance",job="$$job",env="prod"}"#;
        assert_eq!(
            rewrite(expr),
            r#"node_load1{instance=~".*",job=~".*",env="prod"}"#
        );
    }

    #[test]
    fn ignores_dollar_outside_quoted_matchers() {
        let expr = r#"up{job="api"} * $scale"#;
        assert_eq!(rewrite(expr), expr);
    }

    #[test]
    fn rewriting_twice_changes_nothing() {
        let exprs = [
            r#"cpu{host="$host"}"#,
            r#"mem{a="$x",b="y",c="$$z"}"#,
            r#"up{job="$"}"#,
            "plain",
        ];
        for expr in exprs {
            let once = rewrite(expr);
            assert_eq!(rewrite(&once), once, "{expr}");
        }
    }
}
