//! Template references, role variants, and the claimed/unclaimed bookkeeping.
//!
//! A template file stem is `name` or `name.role`; anything with more
//! separators is malformed. Role `all` is the fallback variant, used when no
//! role-specific template exists for the caller's active role.
//!
//! Claiming is deterministic: an action referencing bare `name` claims the
//! exact-role variant for the
//! action's own role first, and claims `(name, all)` only when no exact
//! match exists. Whatever is left unclaimed after all explicit actions are
//! enumerated gets a synthesized pass-through GET action.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::Error;

/// The fallback role variant.
pub const ROLE_ALL: &str = "all";

/// A resolved template: base name, role variant, and the file it points at.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TemplateRef {
    pub name: String,
    pub role: String,
    pub path: PathBuf,
}

/// Splits a template file stem into `(name, role)`.
///
/// `detail` → `("detail", "all")`; `detail.admin` → `("detail", "admin")`;
/// `a.b.c` → [`Error::InvalidTemplateName`].
pub(crate) fn parse_stem(stem: &str, file: &Path) -> Result<(String, String), Error> {
    let mut parts = stem.split('.');
    let name = parts.next().unwrap_or_default();
    let role = parts.next();
    if name.is_empty() || parts.next().is_some() {
        return Err(Error::InvalidTemplateName { file: file.to_owned() });
    }
    Ok((name.to_owned(), role.unwrap_or(ROLE_ALL).to_owned()))
}

/// All templates registered at one route node, grouped by base name, with
/// the claimed subset tracked alongside.
#[derive(Clone, Debug, Default)]
pub(crate) struct TemplateSet {
    by_name: BTreeMap<String, BTreeMap<String, TemplateRef>>,
    claimed: BTreeSet<(String, String)>,
}

impl TemplateSet {
    /// Registers a `(name, role)` variant. A later registration of the same
    /// pair silently replaces the earlier one — override semantics matching
    /// the controller merge.
    pub(crate) fn insert(&mut self, name: String, role: String, path: PathBuf) {
        self.by_name
            .entry(name.clone())
            .or_default()
            .insert(role.clone(), TemplateRef { name, role, path });
    }

    /// Exact role variant if present, else the `all` fallback.
    pub(crate) fn resolve(&self, name: &str, role: &str) -> Option<&TemplateRef> {
        let roles = self.by_name.get(name)?;
        roles.get(role).or_else(|| roles.get(ROLE_ALL))
    }

    /// Marks the variant an action reference resolves to as claimed.
    /// Exact role match claims first; `all` claims only if no exact match
    /// exists. A reference to a name with no registered template is fine —
    /// the action simply does not claim anything.
    pub(crate) fn claim(&mut self, name: &str, role: &str) {
        if let Some(template) = self.resolve(name, role) {
            self.claimed.insert((template.name.clone(), template.role.clone()));
        }
    }

    /// Variants never referenced by an explicit action, in deterministic
    /// `(name, role)` order. These are the candidates for synthesized
    /// pass-through actions.
    pub(crate) fn unclaimed(&self) -> Vec<&TemplateRef> {
        self.by_name
            .values()
            .flat_map(|roles| roles.values())
            .filter(|t| !self.claimed.contains(&(t.name.clone(), t.role.clone())))
            .collect()
    }
}

// ── Renderer seam ─────────────────────────────────────────────────────────────

/// Turns a [`TemplateRef`] plus request-derived data into a response body.
///
/// Template *engines* are out of arbor's scope: bind handlebars, tera, or
/// whatever the application ships by implementing this one method and
/// passing it to [`App::with_renderer`](crate::App::with_renderer).
pub trait Renderer: Send + Sync + 'static {
    fn render(&self, template: &TemplateRef, data: &Value) -> Result<String, Error>;
}

/// Default renderer: returns the template file verbatim, ignoring `data`.
///
/// Enough to serve static markup and to keep synthesized template routes
/// servable before an engine is bound.
pub struct FileRenderer;

impl Renderer for FileRenderer {
    fn render(&self, template: &TemplateRef, _data: &Value) -> Result<String, Error> {
        std::fs::read_to_string(&template.path).map_err(|e| Error::Render {
            name: template.name.clone(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(entries: &[(&str, &str)]) -> TemplateSet {
        let mut s = TemplateSet::default();
        for (name, role) in entries {
            s.insert(
                (*name).to_owned(),
                (*role).to_owned(),
                PathBuf::from(format!("{name}.{role}.hbs")),
            );
        }
        s
    }

    #[test]
    fn stem_without_role_gets_the_all_fallback() {
        let (name, role) = parse_stem("detail", Path::new("detail.hbs")).unwrap();
        assert_eq!((name.as_str(), role.as_str()), ("detail", "all"));
    }

    #[test]
    fn stem_with_role_splits_once() {
        let (name, role) = parse_stem("detail.admin", Path::new("detail.admin.hbs")).unwrap();
        assert_eq!((name.as_str(), role.as_str()), ("detail", "admin"));
    }

    #[test]
    fn stem_with_two_separators_is_malformed() {
        let err = parse_stem("a.b.c", Path::new("a.b.c.hbs")).unwrap_err();
        assert!(matches!(err, Error::InvalidTemplateName { .. }));
    }

    #[test]
    fn later_registration_replaces_same_pair() {
        let mut s = TemplateSet::default();
        s.insert("foo".into(), "all".into(), "base/foo.hbs".into());
        s.insert("foo".into(), "all".into(), "app/foo.hbs".into());
        assert_eq!(s.resolve("foo", "all").unwrap().path, PathBuf::from("app/foo.hbs"));
    }

    #[test]
    fn exact_role_claims_before_the_all_fallback() {
        let mut s = set(&[("foo", "all"), ("foo", "admin")]);
        s.claim("foo", "admin");
        let left: Vec<&str> = s.unclaimed().iter().map(|t| t.role.as_str()).collect();
        assert_eq!(left, ["all"]);
    }

    #[test]
    fn all_claims_only_without_an_exact_match() {
        let mut s = set(&[("foo", "all")]);
        s.claim("foo", "admin");
        assert!(s.unclaimed().is_empty());
    }

    #[test]
    fn claiming_an_unknown_name_is_a_no_op() {
        let mut s = set(&[("foo", "all")]);
        s.claim("bar", "all");
        assert_eq!(s.unclaimed().len(), 1);
    }
}
