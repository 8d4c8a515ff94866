use std::collections::BTreeSet;
use std::fmt;

use crate::checkpoint::Checkpoint;

/// Differences between a checkpoint's weights and a network's parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeightReport {
    /// Parameters the network declares but the checkpoint lacks.
    pub missing: Vec<String>,
    /// Checkpoint weights the network does not declare.
    pub unexpected: Vec<String>,
}

impl WeightReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

impl fmt::Display for WeightReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} missing, {} unexpected",
            self.missing.len(),
            self.unexpected.len()
        )?;
        if let Some(first) = self.missing.first() {
            write!(f, " (first missing {first:?})")?;
        }
        if let Some(first) = self.unexpected.first() {
            write!(f, " (first unexpected {first:?})")?;
        }
        Ok(())
    }
}

/// Matches checkpoint weights against declared parameter names.
///
/// Returns the matched names, sorted, and the report of everything else.
pub fn reconcile_weights(ckpt: &Checkpoint, parameters: &[String]) -> (Vec<String>, WeightReport) {
    reconcile_names(ckpt.weight_names(), parameters)
}

fn reconcile_names<'a>(
    stored: impl Iterator<Item = &'a str>,
    parameters: &[String],
) -> (Vec<String>, WeightReport) {
    let declared: BTreeSet<&str> = parameters.iter().map(String::as_str).collect();
    let stored: BTreeSet<&str> = stored.collect();

    let matched = declared
        .intersection(&stored)
        .map(|s| s.to_string())
        .collect();
    let report = WeightReport {
        missing: declared.difference(&stored).map(|s| s.to_string()).collect(),
        unexpected: stored.difference(&declared).map(|s| s.to_string()).collect(),
    };
    (matched, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exact_match_is_clean() {
        let params = names(&["a", "b"]);
        let (matched, report) = reconcile_names(["b", "a"].into_iter(), &params);
        assert_eq!(matched, params);
        assert!(report.is_clean());
    }

    #[test]
    fn reports_both_directions() {
        let params = names(&["enc_p.weight", "dec.weight", "flow.weight"]);
        let (matched, report) =
            reconcile_names(["dec.weight", "enc_q.weight", "flow.weight"].into_iter(), &params);
        assert_eq!(matched, names(&["dec.weight", "flow.weight"]));
        assert_eq!(report.missing, names(&["enc_p.weight"]));
        assert_eq!(report.unexpected, names(&["enc_q.weight"]));
        assert!(!report.is_clean());
        assert!(report.to_string().starts_with("1 missing, 1 unexpected"));
    }

    #[test]
    fn no_declared_parameters() {
        let (matched, report) = reconcile_names(["w"].into_iter(), &[]);
        assert!(matched.is_empty());
        assert_eq!(report.unexpected, names(&["w"]));
        assert!(report.missing.is_empty());
    }
}
