//! Server directory query.
//!
//! Lists a small sample of candidate servers. This runs straight against
//! the provider and never touches orchestrator state, so it may overlap a
//! running measurement.

use super::provider::{MeasurementProvider, ServerDirectory};
use super::results::ServerInfo;
use crate::errors::{ErrorKind, MeasurementError};
use log::{debug, error};
use serde::Serialize;

/// Most servers returned in one sample.
pub const MAX_SAMPLE_SERVERS: usize = 5;

/// Regions the sample is drawn from, counted from the start of the listing.
pub const MAX_SAMPLE_REGIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectorySample {
    pub available_servers: Vec<ServerInfo>,
    /// Number of region groups in the provider's listing.
    pub total_servers: usize,
}

impl DirectorySample {
    /// Take the first server of each of the first three regions, in
    /// listing order. Empty regions contribute nothing.
    pub fn from_directory(directory: &ServerDirectory) -> Self {
        let available_servers = directory
            .regions
            .iter()
            .take(MAX_SAMPLE_REGIONS)
            .filter_map(|region| region.servers.first())
            .take(MAX_SAMPLE_SERVERS)
            .cloned()
            .collect();

        Self { available_servers, total_servers: directory.region_count() }
    }
}

/// Query the provider and sample its directory.
///
/// Any failure is reported as `DirectoryUnavailable`.
pub async fn sample_servers(
    provider: &dyn MeasurementProvider,
) -> Result<DirectorySample, MeasurementError> {
    let directory = provider.list_servers().await.map_err(|e| {
        error!("Error getting server info: {}", e.message);
        if e.kind == ErrorKind::DirectoryUnavailable {
            e
        } else {
            MeasurementError::directory_unavailable(e.message)
        }
    })?;

    let sample = DirectorySample::from_directory(&directory);
    debug!(
        "Sampled {} of {} servers across {} regions",
        sample.available_servers.len(),
        directory.server_count(),
        directory.region_count()
    );

    Ok(sample)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory(layout: &[(&str, usize)]) -> ServerDirectory {
        ServerDirectory::from_servers(layout.iter().flat_map(|(region, count)| {
            (0..*count).map(move |i| {
                (
                    region.to_string(),
                    ServerInfo::new(format!("{}-{}, XX", region, i), "Test", "XX", "h", 0.0, 0.0),
                )
            })
        }))
    }

    fn names(sample: &DirectorySample) -> Vec<String> {
        sample.available_servers.iter().map(|s| s.name.clone()).collect()
    }

    #[test]
    fn test_sample_takes_one_server_per_region() {
        let sample = DirectorySample::from_directory(&directory(&[
            ("a", 3),
            ("b", 2),
            ("c", 1),
        ]));
        assert_eq!(names(&sample), vec!["a-0, XX", "b-0, XX", "c-0, XX"]);
        assert_eq!(sample.total_servers, 3);
    }

    #[test]
    fn test_large_first_region_does_not_crowd_out_others() {
        let sample =
            DirectorySample::from_directory(&directory(&[("a", 8), ("b", 4)]));
        assert_eq!(names(&sample), vec!["a-0, XX", "b-0, XX"]);
        assert!(sample.available_servers.len() <= MAX_SAMPLE_SERVERS);
    }

    #[test]
    fn test_sample_only_uses_first_three_regions() {
        let sample = DirectorySample::from_directory(&directory(&[
            ("a", 1),
            ("b", 1),
            ("c", 1),
            ("d", 1),
        ]));
        assert_eq!(names(&sample), vec!["a-0, XX", "b-0, XX", "c-0, XX"]);
        assert_eq!(sample.total_servers, 4);
    }

    #[test]
    fn test_empty_directory_samples_nothing() {
        let sample = DirectorySample::from_directory(&ServerDirectory::default());
        assert!(sample.available_servers.is_empty());
        assert_eq!(sample.total_servers, 0);
    }
}
