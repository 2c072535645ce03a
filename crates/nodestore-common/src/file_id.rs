//! Request path → file identity.
//!
//! Data files are addressed as `{job}/{task}/{node}/{timestamp}-{name}`, where
//! `timestamp` is a nanosecond Unix epoch. The full last segment is kept as the
//! filename since it is also the last component of the object key.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Path segment named in an [`FileIdError::EmptySegment`] error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Job,
    Task,
    Node,
    Filename,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Job => "job",
            Self::Task => "task",
            Self::Node => "node",
            Self::Filename => "filename",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileIdError {
    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    #[error("{0} must be nonempty")]
    EmptySegment(Segment),

    #[error("failed to extract timestamp from filename: missing dash separator in filename")]
    MissingTimestampSeparator,

    #[error("failed to extract timestamp from filename: invalid timestamp {0:?}")]
    InvalidTimestamp(String),
}

/// A single stored file, as addressed by a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    pub job_id: String,
    pub task_id: String,
    /// Node ID as given in the request. Policy lookups lowercase it.
    pub node_id: String,
    /// Full last path segment, `<timestamp>-<name>`.
    pub filename: String,
    pub timestamp: DateTime<Utc>,
}

impl FileIdentity {
    /// Parse a path of the form `{job}/{task}/{node}/{timestamp}-{name}`.
    pub fn parse(path: &str) -> Result<Self, FileIdError> {
        let parts: Vec<&str> = path.split('/').collect();
        let [job_id, task_id, node_id, filename] = parts.as_slice() else {
            return Err(FileIdError::InvalidPath(path.to_string()));
        };

        for (segment, value) in [
            (Segment::Job, job_id),
            (Segment::Task, task_id),
            (Segment::Node, node_id),
            (Segment::Filename, filename),
        ] {
            if value.is_empty() {
                return Err(FileIdError::EmptySegment(segment));
            }
        }

        let timestamp = timestamp_from_filename(filename)?;

        Ok(Self {
            job_id: job_id.to_string(),
            task_id: task_id.to_string(),
            node_id: node_id.to_string(),
            filename: filename.to_string(),
            timestamp,
        })
    }

    /// The filename without its timestamp prefix.
    pub fn name(&self) -> &str {
        self.filename
            .split_once('-')
            .map(|(_, name)| name)
            .unwrap_or_default()
    }

    /// Node ID in the form used as a policy table key.
    pub fn policy_node_id(&self) -> String {
        self.node_id.to_lowercase()
    }

    /// Object-store key for this file below `root_folder`.
    pub fn object_key(&self, root_folder: &str) -> String {
        let root = root_folder.trim_matches('/');
        [
            root,
            self.job_id.as_str(),
            self.task_id.as_str(),
            self.node_id.as_str(),
            self.filename.as_str(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
    }
}

impl FromStr for FileIdentity {
    type Err = FileIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn timestamp_from_filename(filename: &str) -> Result<DateTime<Utc>, FileIdError> {
    let (prefix, _) = filename
        .split_once('-')
        .ok_or(FileIdError::MissingTimestampSeparator)?;
    let nanos: i64 = prefix
        .parse()
        .map_err(|_| FileIdError::InvalidTimestamp(prefix.to_string()))?;
    Ok(DateTime::from_timestamp_nanos(nanos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_path() {
        let f = FileIdentity::parse(
            "sage-job/imagesampler-top/000048B02D05A0A4/1638576647406523064-sample.jpg",
        )
        .unwrap();
        assert_eq!(f.job_id, "sage-job");
        assert_eq!(f.task_id, "imagesampler-top");
        assert_eq!(f.node_id, "000048B02D05A0A4");
        assert_eq!(f.filename, "1638576647406523064-sample.jpg");
        assert_eq!(f.name(), "sample.jpg");
        assert_eq!(f.timestamp.timestamp_nanos_opt(), Some(1638576647406523064));
        assert_eq!(f.policy_node_id(), "000048b02d05a0a4");
    }

    #[test]
    fn only_first_dash_separates_timestamp() {
        let f: FileIdentity = "j/t/n/100-my-file-name.flac".parse().unwrap();
        assert_eq!(f.name(), "my-file-name.flac");
        assert_eq!(f.timestamp.timestamp_nanos_opt(), Some(100));
    }

    #[test]
    fn leading_dash_is_not_a_sign() {
        let err = FileIdentity::parse("j/t/n/-5-x").unwrap_err();
        assert_eq!(err, FileIdError::InvalidTimestamp(String::new()));

        let f = FileIdentity::parse("j/t/n/0-x").unwrap();
        assert_eq!(f.timestamp, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn rejects_wrong_segment_count() {
        for path in ["", "j", "j/t", "j/t/n", "j/t/n/1-a/b", "/j/t/n/1-a"] {
            assert!(
                matches!(FileIdentity::parse(path), Err(FileIdError::InvalidPath(_))),
                "{path:?} should be an invalid path"
            );
        }
    }

    #[test]
    fn rejects_empty_segments() {
        let cases = [
            ("/t/n/1-a", Segment::Job),
            ("j//n/1-a", Segment::Task),
            ("j/t//1-a", Segment::Node),
            ("j/t/n/", Segment::Filename),
        ];
        for (path, segment) in cases {
            assert_eq!(
                FileIdentity::parse(path),
                Err(FileIdError::EmptySegment(segment))
            );
        }
        assert_eq!(
            FileIdError::EmptySegment(Segment::Filename).to_string(),
            "filename must be nonempty"
        );
    }

    #[test]
    fn rejects_missing_separator() {
        assert_eq!(
            FileIdentity::parse("j/t/n/1638576647406523064"),
            Err(FileIdError::MissingTimestampSeparator)
        );
    }

    #[test]
    fn rejects_bad_timestamps() {
        for prefix in ["abc", "12a", "99999999999999999999", "1.5", " 1"] {
            let path = format!("j/t/n/{prefix}-file.txt");
            assert_eq!(
                FileIdentity::parse(&path),
                Err(FileIdError::InvalidTimestamp(prefix.to_string()))
            );
        }
    }

    #[test]
    fn object_key_joins_root_folder() {
        let f = FileIdentity::parse("j/t/N/1-a.txt").unwrap();
        assert_eq!(f.object_key(""), "j/t/N/1-a.txt");
        assert_eq!(f.object_key("node-data"), "node-data/j/t/N/1-a.txt");
        assert_eq!(f.object_key("/node-data/"), "node-data/j/t/N/1-a.txt");
    }
}
