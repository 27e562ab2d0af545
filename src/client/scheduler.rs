//! Priority ordering and request validation
// (c) 2026 Ferry contributors

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use super::{CollisionPolicy, TransferRequest};
use crate::{catalog::Catalog, Configuration};

/// How urgently a file is wanted.
///
/// Each level maps to a delay (see [`Configuration::delay_for`]) which doubles as its scheduling rank
/// and as the pause before each negotiation retry.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Priority {
    /// Fetched first, retried fastest
    Critical,
    /// Fetched after critical files
    High,
    /// Everything else
    #[default]
    Normal,
}

/// A validated request, ready to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledJob {
    /// What was asked for
    pub request: TransferRequest,
    /// Pause between negotiation attempts; also the sort key
    pub retry_delay: Duration,
    /// Local file the data is written to
    pub destination: PathBuf,
}

/// Why a request was dropped before any network traffic
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The server does not offer this file
    #[error("{path} is not offered by the server")]
    NotInCatalog {
        /// Requested path
        path: String,
    },
    /// Another request already claims the same output file
    #[error("{path} would overwrite the download of {earlier}")]
    Collision {
        /// Requested path
        path: String,
        /// The request which got there first
        earlier: String,
    },
    /// The path cannot be mapped onto a local file
    #[error("{path} cannot be stored locally")]
    Unstorable {
        /// Requested path
        path: String,
    },
}

/// Result of scheduling a manifest
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Schedule {
    /// Jobs in fetch order
    pub jobs: Vec<ScheduledJob>,
    /// Requests that will not be fetched, in manifest order
    pub rejected: Vec<Rejection>,
}

/// Validates requests against the catalog and orders them by priority.
///
/// The ordering is stable: files of equal priority keep their manifest order.
#[must_use]
pub fn schedule(requests: Vec<TransferRequest>, catalog: &Catalog, config: &Configuration) -> Schedule {
    let mut out = Schedule::default();
    let mut claimed: HashMap<PathBuf, String> = HashMap::new();

    for request in requests {
        if !catalog.contains(&request.path) {
            out.rejected.push(Rejection::NotInCatalog { path: request.path });
            continue;
        }
        let destination = match config.collision.destination(&config.output_dir, &request.path) {
            Ok(d) => d,
            Err(e) => {
                debug!("{}: {e}", request.path);
                out.rejected.push(Rejection::Unstorable { path: request.path });
                continue;
            }
        };
        if let Some(earlier) = claimed.get(&destination) {
            if config.collision == CollisionPolicy::Reject {
                out.rejected.push(Rejection::Collision {
                    path: request.path,
                    earlier: earlier.clone(),
                });
                continue;
            }
        } else {
            let _ = claimed.insert(destination.clone(), request.path.clone());
        }
        out.jobs.push(ScheduledJob {
            retry_delay: config.delay_for(request.priority),
            request,
            destination,
        });
    }
    out.jobs.sort_by_key(|j| j.retry_delay);
    out
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod test {
    use std::path::PathBuf;
    use std::str::FromStr as _;
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{schedule, Priority, Rejection};
    use crate::{
        catalog::Catalog,
        client::{CollisionPolicy, TransferRequest},
        Configuration,
    };

    fn config() -> Configuration {
        Configuration::system_default().clone()
    }

    fn paths(s: &super::Schedule) -> Vec<&str> {
        s.jobs.iter().map(|j| j.request.path.as_str()).collect()
    }

    #[rstest]
    #[case("critical", Priority::Critical)]
    #[case("HIGH", Priority::High)]
    #[case("Normal", Priority::Normal)]
    fn priority_names(#[case] s: &str, #[case] expected: Priority) {
        assert_eq!(Priority::from_str(s).unwrap(), expected);
    }

    #[test]
    fn unknown_priority_name() {
        assert!(Priority::from_str("URGENT").is_err());
    }

    #[test]
    fn priority_order() {
        let catalog = Catalog::from_entries(["a.txt", "b.txt", "c.txt"]);
        let s = schedule(
            vec![
                TransferRequest::new("a.txt", Priority::Normal),
                TransferRequest::new("b.txt", Priority::Critical),
                TransferRequest::new("c.txt", Priority::High),
            ],
            &catalog,
            &config(),
        );
        assert_eq!(paths(&s), ["b.txt", "c.txt", "a.txt"]);
        assert_eq!(s.jobs[0].retry_delay, Duration::from_secs(1));
        assert_eq!(s.jobs[0].destination, PathBuf::from("output").join("b.txt"));
        assert!(s.rejected.is_empty());
    }

    #[test]
    fn equal_priorities_keep_manifest_order() {
        let catalog = Catalog::from_entries(["d", "c", "b", "a", "z"]);
        let s = schedule(
            vec![
                TransferRequest::new("d", Priority::High),
                TransferRequest::new("c", Priority::Normal),
                TransferRequest::new("b", Priority::High),
                TransferRequest::new("a", Priority::Normal),
                TransferRequest::new("z", Priority::Critical),
            ],
            &catalog,
            &config(),
        );
        assert_eq!(paths(&s), ["z", "d", "b", "c", "a"]);
    }

    #[test]
    fn not_in_catalog() {
        let catalog = Catalog::from_entries(["x.txt"]);
        let s = schedule(
            vec![
                TransferRequest::new("y.txt", Priority::Critical),
                TransferRequest::new("x.txt", Priority::Normal),
            ],
            &catalog,
            &config(),
        );
        assert_eq!(paths(&s), ["x.txt"]);
        assert_eq!(
            s.rejected,
            vec![Rejection::NotInCatalog {
                path: "y.txt".into()
            }]
        );
        assert_eq!(s.rejected[0].to_string(), "y.txt is not offered by the server");
    }

    #[test]
    fn collision_rejected() {
        let catalog = Catalog::from_entries(["one/f.txt", "two/f.txt"]);
        let requests = vec![
            TransferRequest::new("one/f.txt", Priority::Normal),
            TransferRequest::new("two/f.txt", Priority::Critical),
        ];
        let s = schedule(requests, &catalog, &config());
        assert_eq!(paths(&s), ["one/f.txt"]);
        assert_eq!(
            s.rejected,
            vec![Rejection::Collision {
                path: "two/f.txt".into(),
                earlier: "one/f.txt".into(),
            }]
        );
    }

    #[rstest]
    #[case(CollisionPolicy::Overwrite, ["f.txt", "f.txt"])]
    #[case(CollisionPolicy::Namespace, ["one/f.txt", "two/f.txt"])]
    fn collision_allowed(#[case] policy: CollisionPolicy, #[case] expected: [&str; 2]) {
        let catalog = Catalog::from_entries(["one/f.txt", "two/f.txt"]);
        let mut cfg = config();
        cfg.collision = policy;
        let s = schedule(
            vec![
                TransferRequest::new("one/f.txt", Priority::Normal),
                TransferRequest::new("two/f.txt", Priority::Normal),
            ],
            &catalog,
            &cfg,
        );
        assert!(s.rejected.is_empty());
        let dests: Vec<_> = s.jobs.iter().map(|j| j.destination.clone()).collect();
        let wanted: Vec<_> = expected
            .iter()
            .map(|p| p.split('/').fold(PathBuf::from("output"), |acc, c| acc.join(c)))
            .collect();
        assert_eq!(dests, wanted);
    }

    #[test]
    fn repeated_request_with_reject() {
        let catalog = Catalog::from_entries(["a"]);
        let s = schedule(
            vec![
                TransferRequest::new("a", Priority::Normal),
                TransferRequest::new("a", Priority::Normal),
            ],
            &catalog,
            &config(),
        );
        assert_eq!(s.jobs.len(), 1);
        assert_eq!(s.rejected.len(), 1);
    }
}
