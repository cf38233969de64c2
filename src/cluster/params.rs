// HDBSCAN hyperparameters.

use serde::{Deserialize, Serialize};

use super::error::{ClusterError, Result};

/// How flat clusters are picked out of the condensed tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMethod {
    /// Excess of mass: keep a parent when it is more stable than its children combined.
    #[default]
    Eom,
    /// Only the leaves of the condensed tree.
    Leaf,
}

impl std::str::FromStr for SelectionMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eom" => Ok(Self::Eom),
            "leaf" => Ok(Self::Leaf),
            other => Err(format!("unknown selection method '{other}' (expected eom or leaf)")),
        }
    }
}

/// Parameters for the HDBSCAN backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HdbscanParams {
    /// Smallest group of points that still counts as a cluster.
    pub min_cluster_size: usize,
    /// Neighbourhood size for the core distance (the point itself included).
    pub min_samples: usize,
    pub selection: SelectionMethod,
    /// Allow the root of the condensed tree to be selected as the only cluster.
    pub allow_single_cluster: bool,
}

impl Default for HdbscanParams {
    fn default() -> Self {
        Self {
            min_cluster_size: 10,
            min_samples: 5,
            selection: SelectionMethod::Eom,
            allow_single_cluster: false,
        }
    }
}

impl HdbscanParams {
    pub fn new(min_cluster_size: usize, min_samples: usize) -> Self {
        Self {
            min_cluster_size,
            min_samples,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_selection(mut self, selection: SelectionMethod) -> Self {
        self.selection = selection;
        self
    }

    #[must_use]
    pub fn with_single_cluster(mut self, allow: bool) -> Self {
        self.allow_single_cluster = allow;
        self
    }

    /// Reject parameter combinations the algorithm cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.min_cluster_size < 2 {
            return Err(ClusterError::invalid_parameter(
                "min_cluster_size",
                format!("must be at least 2, got {}", self.min_cluster_size),
            ));
        }
        if self.min_samples == 0 {
            return Err(ClusterError::invalid_parameter(
                "min_samples",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(HdbscanParams::default().validate().is_ok());
    }

    #[test]
    fn rejects_small_cluster_size() {
        assert!(HdbscanParams::new(1, 1).validate().is_err());
    }

    #[test]
    fn rejects_zero_min_samples() {
        assert!(HdbscanParams::new(5, 0).validate().is_err());
    }

    #[test]
    fn parses_selection_method() {
        assert_eq!("EOM".parse::<SelectionMethod>().unwrap(), SelectionMethod::Eom);
        assert_eq!("leaf".parse::<SelectionMethod>().unwrap(), SelectionMethod::Leaf);
        assert!("tree".parse::<SelectionMethod>().is_err());
    }
}
