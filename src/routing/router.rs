//! Service route lookup.
//!
//! # Design Decisions
//! - Immutable after construction; reloads build a new router
//! - Longest prefix wins, so nested prefixes resolve deterministically
//! - Explicit `None` rather than a silent default route

use url::Url;

use crate::config::ServiceRoute;
use crate::routing::matcher::PathPrefixMatcher;

#[derive(Debug, thiserror::Error)]
#[error("service '{name}' has an invalid upstream '{upstream}': {source}")]
pub struct RouteError {
    pub name: String,
    pub upstream: String,
    #[source]
    pub source: url::ParseError,
}

#[derive(Debug, Clone)]
struct CompiledRoute {
    name: String,
    matcher: PathPrefixMatcher,
    upstream: Url,
}

/// Result of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub service: String,
    /// Full upstream URL with the prefix stripped and the query kept.
    pub target: Url,
}

#[derive(Debug, Clone, Default)]
pub struct ServiceRouter {
    routes: Vec<CompiledRoute>,
}

impl ServiceRouter {
    pub fn from_config(services: &[ServiceRoute]) -> Result<Self, RouteError> {
        let mut routes = services
            .iter()
            .map(|service| {
                let upstream = Url::parse(&service.upstream).map_err(|source| RouteError {
                    name: service.name.clone(),
                    upstream: service.upstream.clone(),
                    source,
                })?;
                Ok(CompiledRoute {
                    name: service.name.clone(),
                    matcher: PathPrefixMatcher::new(service.prefix.as_str()),
                    upstream,
                })
            })
            .collect::<Result<Vec<_>, RouteError>>()?;

        routes.sort_by(|a, b| b.matcher.prefix().len().cmp(&a.matcher.prefix().len()));
        Ok(Self { routes })
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// `(name, prefix, upstream)` in match order.
    pub fn routes(&self) -> impl Iterator<Item = (&str, &str, &Url)> {
        self.routes
            .iter()
            .map(|r| (r.name.as_str(), r.matcher.prefix(), &r.upstream))
    }

    pub fn match_path(&self, path: &str, query: Option<&str>) -> Option<RouteMatch> {
        self.routes.iter().find_map(|route| {
            let rest = route.matcher.strip(path)?;
            let mut target = route.upstream.clone();
            let base = target.path().trim_end_matches('/');
            let joined = format!("{}{}", base, rest);
            target.set_path(&joined);
            target.set_query(query.filter(|q| !q.is_empty()));
            Some(RouteMatch {
                service: route.name.clone(),
                target,
            })
        })
    }
}
