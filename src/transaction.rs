//! Resolution transactions
//!
//! A [`Transaction`] turns a set of requirement strings into the list of
//! wheels to install, fetching release listings and wheel archives through
//! the [`Index`] seam. Work is a queue of requirement strings: resolving a
//! wheel enqueues its dependencies, and the transaction finishes when the
//! queue drains. Each package is locked to one version the first time it
//! is resolved; later requirements against a locked name either pass the
//! constraint check, widen the requested extras, or conflict.

use crate::marker::MarkerContext;
use crate::metadata;
use crate::platform::Platform;
use crate::registry::{verify_sha256, Index};
use crate::requirement::Requirement;
use crate::resolver::find_wheel;
use crate::version::Version;
use crate::wheel::WheelInfo;
use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

#[derive(Debug, Clone)]
pub struct TransactionOptions {
    /// Follow `Requires-Dist` dependencies.
    pub deps: bool,
    /// Allow pre-release versions when no stable release matches.
    pub pre: bool,
    /// Collect per-requirement failures instead of stopping at the first.
    pub keep_going: bool,
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            deps: true,
            pre: false,
            keep_going: false,
        }
    }
}

pub struct Transaction<'a> {
    index: &'a dyn Index,
    platform: Platform,
    ctx: MarkerContext,
    options: TransactionOptions,
    queue: VecDeque<String>,
    /// Name -> version chosen for this transaction (including packages
    /// seeded as already installed).
    pub locked: BTreeMap<String, Version>,
    /// Extras already expanded per package.
    extras_seen: BTreeMap<String, BTreeSet<String>>,
    /// Wheels to install, in resolution order.
    pub wheels: Vec<WheelInfo>,
    /// Requirement strings that failed under keep-going.
    pub failed: Vec<String>,
}

impl<'a> Transaction<'a> {
    pub fn new(index: &'a dyn Index, platform: Platform, options: TransactionOptions) -> Self {
        let ctx = platform.marker_context();
        Self {
            index,
            platform,
            ctx,
            options,
            queue: VecDeque::new(),
            locked: BTreeMap::new(),
            extras_seen: BTreeMap::new(),
            wheels: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Override a marker variable for this transaction.
    pub fn set_marker(&mut self, name: &str, value: &str) {
        self.ctx.set(name, value);
    }

    /// Record a package as already present so it will not be re-resolved.
    pub fn seed_locked(&mut self, name: &str, version: Version) {
        self.locked.insert(name.to_string(), version);
    }

    /// Resolve a set of requirement strings, filling `wheels`.
    ///
    /// Under keep-going, failing requirements land in `failed` and the
    /// final error aggregates them; otherwise the first failure aborts.
    pub fn gather<S: AsRef<str>>(&mut self, requirements: &[S]) -> Result<()> {
        for requirement in requirements {
            self.queue.push_back(requirement.as_ref().to_string());
        }
        while let Some(item) = self.queue.pop_front() {
            match self.add_requirement(&item) {
                Ok(()) => {}
                Err(err) if self.options.keep_going => {
                    tracing::warn!(requirement = %item, %err, "requirement failed");
                    self.failed.push(item);
                }
                Err(err) => return Err(err),
            }
        }
        if !self.failed.is_empty() {
            return Err(Error::AggregateFailure(self.failed.clone()));
        }
        Ok(())
    }

    fn add_requirement(&mut self, item: &str) -> Result<()> {
        if Requirement::is_direct_locator(item) {
            let wheel = WheelInfo::from_url(item)?;
            self.platform.check_compatible(&wheel)?;
            return self.add_wheel(wheel, &BTreeSet::new());
        }
        let requirement: Requirement = item.parse()?;
        if let Some(marker) = &requirement.marker {
            if !marker.evaluate(&self.ctx) {
                tracing::debug!(requirement = %item, "skipped by environment marker");
                return Ok(());
            }
        }
        self.add_named(requirement)
    }

    fn add_named(&mut self, requirement: Requirement) -> Result<()> {
        if let Some(locked) = self.locked.get(&requirement.name).cloned() {
            if !requirement.specifiers.0.is_empty() && !requirement.specifiers.matches(&locked) {
                return Err(Error::DependencyConflict(format!(
                    "{} {} is already pinned by this transaction, which does not satisfy '{}'",
                    requirement.name, locked, requirement
                )));
            }
            return self.widen_extras(&requirement);
        }

        let release_index = self.index.release_index(&requirement.name)?;
        let wheel = find_wheel(&release_index, &requirement, &self.platform, self.options.pre)?;
        self.add_wheel(wheel, &requirement.extras)
    }

    /// A locked package requested again with extras it was not resolved
    /// with: expand the stored metadata under the new extras. No re-fetch
    /// happens; only dependency expansion.
    fn widen_extras(&mut self, requirement: &Requirement) -> Result<()> {
        let seen = self.extras_seen.entry(requirement.name.clone()).or_default();
        let new_extras: BTreeSet<String> = requirement
            .extras
            .iter()
            .filter(|e| !seen.contains(*e))
            .cloned()
            .collect();
        if new_extras.is_empty() || !self.options.deps {
            return Ok(());
        }
        seen.extend(new_extras.iter().cloned());

        let Some(pos) = self.wheels.iter().position(|w| w.name == requirement.name) else {
            // seeded as installed; there is no metadata to expand
            return Ok(());
        };
        let requires_dist = self.wheels[pos].requires_dist.clone();
        let depends = self.expand(&requires_dist, &new_extras)?;
        let wheel = &mut self.wheels[pos];
        for name in depends {
            if !wheel.depends.contains(&name) {
                wheel.depends.push(name);
            }
        }
        Ok(())
    }

    fn add_wheel(&mut self, mut wheel: WheelInfo, extras: &BTreeSet<String>) -> Result<()> {
        if let Some(locked) = self.locked.get(&wheel.name) {
            if *locked == wheel.version {
                return Ok(());
            }
            return Err(Error::DependencyConflict(format!(
                "{} {} is already pinned by this transaction, but {} was also requested",
                wheel.name, locked, wheel.version
            )));
        }

        let data = self.index.fetch(&wheel.url)?;
        if let Some(expected) = &wheel.sha256 {
            verify_sha256(&data, expected, &wheel.filename)?;
        }
        let meta = metadata::extract(&data)?;
        if meta.name != wheel.name {
            tracing::warn!(
                filename = %wheel.filename,
                metadata_name = %meta.name,
                "wheel filename and metadata disagree on the project name"
            );
        }
        wheel.data = data;
        wheel.requires_dist = meta.requires_dist;
        wheel.imports = meta.imports;

        if self.options.deps {
            wheel.depends = self.expand(&wheel.requires_dist.clone(), extras)?;
        }

        // Locked only once the wheel is certain to be installed; a failure
        // above must leave the name free to be resolved again.
        self.locked.insert(wheel.name.clone(), wheel.version.clone());
        self.extras_seen
            .entry(wheel.name.clone())
            .or_default()
            .extend(extras.iter().cloned());

        tracing::info!(package = %wheel.name, version = %wheel.version, "resolved");
        self.wheels.push(wheel);
        Ok(())
    }

    /// Evaluate dependency strings under the base context plus each
    /// requested extra, enqueue the ones that apply, and return their
    /// names in metadata order.
    ///
    /// Queued strings are written without their marker: the decision has
    /// already been made here and must not be re-evaluated under the base
    /// context when the item is popped.
    ///
    /// Nothing is enqueued unless every dependency string parses, so a
    /// malformed entry does not leave half the list in flight.
    fn expand(&mut self, requires_dist: &[String], extras: &BTreeSet<String>) -> Result<Vec<String>> {
        let mut depends = Vec::new();
        let mut pending = Vec::new();
        for dep in requires_dist {
            let requirement: Requirement = dep.parse()?;
            let applies = match &requirement.marker {
                None => true,
                Some(marker) => {
                    marker.evaluate(&self.ctx)
                        || extras.iter().any(|e| marker.evaluate(&self.ctx.with_extra(e)))
                }
            };
            if !applies {
                continue;
            }
            if !depends.contains(&requirement.name) {
                depends.push(requirement.name.clone());
            }
            pending.push(requirement.to_string());
        }
        self.queue.extend(pending);
        Ok(depends)
    }
}
