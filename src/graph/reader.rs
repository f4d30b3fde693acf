use std::collections::HashSet;
use std::io;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::ReadError;
use crate::graph::record::LicenseMetadata;
use crate::graph::source::MetadataSource;
use crate::graph::{EdgeAnnotations, GraphBuilder, LicenseGraph, TargetNode};
use crate::license::classifier::KindOverrides;
use crate::license::condition::LicenseCondition;

/// Files read concurrently by default.
pub const DEFAULT_WORKERS: usize = 5;

/// Conventional suffix of license metadata files.
pub const METADATA_SUFFIX: &str = ".meta_lic";

#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Upper bound on files open at once.
    pub workers: usize,
    /// Appended to root identifiers that lack it.
    pub suffix: String,
    /// Infer conditions from license kinds when a record declares none.
    pub infer_conditions: bool,
    pub kind_overrides: KindOverrides,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            workers: DEFAULT_WORKERS,
            suffix: METADATA_SUFFIX.to_string(),
            infer_conditions: true,
            kind_overrides: KindOverrides::new(),
        }
    }
}

type ReadResult = Result<(String, LicenseMetadata), ReadError>;

/// Read every metadata file reachable from `roots` and assemble the graph.
///
/// Each file is read and parsed on its own task; at most `options.workers`
/// tasks hold a file open at a time. Dependencies are scheduled as soon as the
/// record naming them is parsed, and each file is scheduled exactly once.
/// The first failure stops the read and is returned; no partial graph is
/// produced.
pub async fn read_license_graph<S: MetadataSource>(
    source: Arc<S>,
    roots: &[String],
    options: &ReaderOptions,
) -> Result<LicenseGraph, ReadError> {
    if roots.is_empty() {
        return Err(ReadError::NoRoots);
    }

    let permits = Arc::new(Semaphore::new(options.workers.max(1)));
    let mut tasks: JoinSet<ReadResult> = JoinSet::new();
    let mut scheduled: HashSet<String> = HashSet::new();
    let mut builder = GraphBuilder::default();

    for root in roots {
        let file = with_suffix(root, &options.suffix);
        builder.add_root(file.clone());
        if scheduled.insert(file.clone()) {
            spawn_read(&mut tasks, &source, &permits, file);
        }
    }

    while let Some(joined) = tasks.join_next().await {
        let (name, record) = match joined.map_err(ReadError::from).and_then(|r| r) {
            Ok(read) => read,
            Err(err) => {
                tasks.shutdown().await;
                return Err(err);
            }
        };

        for dep in &record.deps {
            builder.add_edge(&name, &dep.file, EdgeAnnotations::new(dep.annotations.iter().cloned()));
            if scheduled.insert(dep.file.clone()) {
                spawn_read(&mut tasks, &source, &permits, dep.file.clone());
            }
        }

        for unknown in record
            .license_conditions
            .iter()
            .filter(|c| LicenseCondition::from_name(c).is_none())
        {
            warn!(file = %name, condition = %unknown, "ignoring unrecognized license condition");
        }

        let node = TargetNode::from_metadata(
            name,
            record,
            options.infer_conditions,
            &options.kind_overrides,
        );
        builder.add_node(node);
    }

    let graph = builder.build()?;
    info!(
        roots = graph.roots().len(),
        nodes = graph.len(),
        edges = graph.edges().len(),
        "assembled license graph"
    );
    Ok(graph)
}

fn spawn_read<S: MetadataSource>(
    tasks: &mut JoinSet<ReadResult>,
    source: &Arc<S>,
    permits: &Arc<Semaphore>,
    name: String,
) {
    let source = Arc::clone(source);
    let permits = Arc::clone(permits);
    tasks.spawn(async move {
        let _permit = match permits.acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                return Err(ReadError::Io {
                    path: name,
                    source: io::Error::new(io::ErrorKind::Interrupted, "reader shut down"),
                })
            }
        };

        debug!(file = %name, "reading license metadata");
        let content = source.read(&name).await.map_err(|source| ReadError::Io {
            path: name.clone(),
            source,
        })?;
        let record = LicenseMetadata::parse(&content).map_err(|source| ReadError::Malformed {
            path: name.clone(),
            source,
        })?;
        Ok((name, record))
    });
}

fn with_suffix(file: &str, suffix: &str) -> String {
    if file.ends_with(suffix) {
        file.to_string()
    } else {
        format!("{file}{suffix}")
    }
}
