//! # Route Manifests
//!
//! A declarative description of a routing table, used by the `switchyard`
//! binary to list, check and try out routes without writing Rust.
//!
//! ```yaml
//! middleware: [error, tracing]
//! routes:
//!   - method: GET
//!     path: /health
//!     handler: health
//! groups:
//!   - prefix: /api
//!     middleware: [metrics]
//!     routes:
//!       - method: GET
//!         paths: [/pets, /animals]
//!         handler: list_pets
//!       - method: GET
//!         path: /pets/:id
//!         handler: get_pet
//! ```
//!
//! Handlers are names only; every route is served by
//! [`echo_handler`](crate::echo::echo_handler). Middleware names map to the
//! built-ins: `tracing`, `metrics`, `error`, `recover`.

use http::Method;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::echo::echo_handler;
use crate::middleware::{
    ErrorMiddleware, MetricsMiddleware, Middleware, RecoverMiddleware, TracingMiddleware,
};
use crate::router::{compile, join_patterns, PatternError};
use crate::table::{GroupId, RouteTable};

/// Errors raised while loading or applying a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("unsupported manifest extension for {0} (expected .yaml, .yml or .toml)")]
    UnsupportedFormat(PathBuf),
    #[error("unknown HTTP method '{0}'")]
    UnknownMethod(String),
    #[error("unknown middleware '{0}' (expected tracing, metrics, error or recover)")]
    UnknownMiddleware(String),
    #[error("route for handler '{0}' has neither `path` nor `paths`")]
    MissingPath(String),
    #[error(transparent)]
    Pattern(#[from] PatternError),
}

/// One route entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteSpec {
    pub method: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub paths: Vec<String>,
    pub handler: String,
    #[serde(default)]
    pub middleware: Vec<String>,
}

impl RouteSpec {
    /// `path` followed by `paths`.
    #[must_use]
    pub fn all_paths(&self) -> Vec<&str> {
        self.path
            .iter()
            .chain(self.paths.iter())
            .map(String::as_str)
            .collect()
    }
}

/// A group of routes under a shared prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GroupSpec {
    pub prefix: String,
    pub middleware: Vec<String>,
    pub routes: Vec<RouteSpec>,
    pub groups: Vec<GroupSpec>,
}

/// Top level of a manifest: the root group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouteManifest {
    pub middleware: Vec<String>,
    pub routes: Vec<RouteSpec>,
    pub groups: Vec<GroupSpec>,
}

/// A route with its group prefixes applied, for listings and checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    pub method: String,
    pub pattern: String,
    pub handler: String,
    /// Effective middleware names, outermost first
    pub middleware: Vec<String>,
}

/// A problem found by [`RouteManifest::check`].
#[derive(Debug)]
pub struct CheckIssue {
    pub route: ResolvedRoute,
    pub error: ManifestError,
}

fn parse_method(name: &str) -> Result<Method, ManifestError> {
    Method::from_str(&name.to_ascii_uppercase())
        .map_err(|_| ManifestError::UnknownMethod(name.to_string()))
}

fn build_middleware(name: &str) -> Result<Arc<dyn Middleware>, ManifestError> {
    let mw: Arc<dyn Middleware> = match name.to_ascii_lowercase().as_str() {
        "tracing" => Arc::new(TracingMiddleware),
        "metrics" => Arc::new(MetricsMiddleware::new()),
        "error" => Arc::new(ErrorMiddleware::new()),
        "recover" => Arc::new(RecoverMiddleware),
        _ => return Err(ManifestError::UnknownMiddleware(name.to_string())),
    };
    Ok(mw)
}

fn build_middlewares(names: &[String]) -> Result<Vec<Arc<dyn Middleware>>, ManifestError> {
    names.iter().map(|n| build_middleware(n)).collect()
}

impl RouteManifest {
    /// Load from a `.yaml`/`.yml` or `.toml` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml" | "yml") => {
                if text.trim().is_empty() {
                    return Ok(Self::default());
                }
                serde_yaml::from_str(&text).map_err(|source| ManifestError::Yaml {
                    path: path.to_path_buf(),
                    source,
                })
            }
            Some("toml") => toml::from_str(&text).map_err(|source| ManifestError::Toml {
                path: path.to_path_buf(),
                source,
            }),
            _ => Err(ManifestError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Every route with full pattern and effective middleware, in manifest order
    /// (root routes, then groups depth-first).
    #[must_use]
    pub fn resolve(&self) -> Vec<ResolvedRoute> {
        let mut out = Vec::new();
        resolve_level(
            "",
            &self.middleware,
            &self.routes,
            &self.groups,
            &[],
            &mut out,
        );
        out
    }

    /// Validate every route without stopping at the first problem.
    #[must_use]
    pub fn check(&self) -> Vec<CheckIssue> {
        self.resolve()
            .into_iter()
            .filter_map(|route| {
                let result = parse_method(&route.method)
                    .and_then(|_| {
                        route
                            .middleware
                            .iter()
                            .try_for_each(|n| build_middleware(n).map(|_| ()))
                    })
                    .and_then(|()| {
                        if route.pattern.is_empty() {
                            Err(ManifestError::MissingPath(route.handler.clone()))
                        } else {
                            compile(&route.pattern).map(|_| ()).map_err(ManifestError::from)
                        }
                    });
                result.err().map(|error| CheckIssue { route, error })
            })
            .collect()
    }

    /// Register everything into a fresh [`RouteTable`].
    pub fn build_table(&self) -> Result<RouteTable, ManifestError> {
        let mut table = RouteTable::new();
        let root = table.root();
        for mw in build_middlewares(&self.middleware)? {
            table.use_middleware(root, mw);
        }
        register_routes(&mut table, root, &self.routes)?;
        for group in &self.groups {
            register_group(&mut table, root, group)?;
        }
        Ok(table)
    }
}

fn resolve_level(
    prefix: &str,
    middleware: &[String],
    routes: &[RouteSpec],
    groups: &[GroupSpec],
    inherited: &[String],
    out: &mut Vec<ResolvedRoute>,
) {
    let mut effective = inherited.to_vec();
    effective.extend(middleware.iter().cloned());

    for route in routes {
        let mut route_mw = effective.clone();
        route_mw.extend(route.middleware.iter().cloned());
        let paths = route.all_paths();
        if paths.is_empty() {
            out.push(ResolvedRoute {
                method: route.method.clone(),
                pattern: String::new(),
                handler: route.handler.clone(),
                middleware: route_mw.clone(),
            });
        }
        for path in paths {
            out.push(ResolvedRoute {
                method: route.method.clone(),
                pattern: join_patterns(prefix, path),
                handler: route.handler.clone(),
                middleware: route_mw.clone(),
            });
        }
    }

    for group in groups {
        let group_prefix = join_patterns(prefix, &group.prefix);
        resolve_level(
            &group_prefix,
            &group.middleware,
            &group.routes,
            &group.groups,
            &effective,
            out,
        );
    }
}

fn register_routes(
    table: &mut RouteTable,
    group: GroupId,
    routes: &[RouteSpec],
) -> Result<(), ManifestError> {
    for route in routes {
        let method = parse_method(&route.method)?;
        let paths = route.all_paths();
        if paths.is_empty() {
            return Err(ManifestError::MissingPath(route.handler.clone()));
        }
        let route_mw = build_middlewares(&route.middleware)?;
        let handler = echo_handler(&route.handler);
        if route_mw.is_empty() {
            table.register_paths(group, method, &paths, handler)?;
        } else {
            for path in paths {
                table.register_with(group, method.clone(), path, &route_mw, Arc::clone(&handler))?;
            }
        }
    }
    Ok(())
}

fn register_group(
    table: &mut RouteTable,
    parent: GroupId,
    spec: &GroupSpec,
) -> Result<(), ManifestError> {
    let id = table.create_group(parent, &spec.prefix);
    for mw in build_middlewares(&spec.middleware)? {
        table.use_middleware(id, mw);
    }
    register_routes(table, id, &spec.routes)?;
    for child in &spec.groups {
        register_group(table, id, child)?;
    }
    Ok(())
}
