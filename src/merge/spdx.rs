//! Relationship graph merging for SPDX documents.
//!
//! The incoming graph is re-rooted onto the base graph: its root and middle
//! elements are replaced by the base's, packages dropped as duplicates are
//! replaced by their survivors, and edges that no longer connect surviving
//! elements are discarded. Packages left without any relationship are pruned.

use super::graph::{Anchors, RelationshipGraph};
use super::MergePolicy;
use crate::error::{ErrorContext, Result};
use crate::matching::{
    authority_keys, scanner_keys, DuplicateReason, PurlNormalizer, SbomItem, ScannerFilter,
};
use crate::model::{
    Annotation, DocumentAnnotation, ExternalRef, Purl, Relationship, RelationshipType,
    SpdxDocument, SpdxPackage,
};
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Merge two SPDX documents.
///
/// The base document provides the envelope and the identity space. Under
/// [`MergePolicy::PreferAuthority`] the incoming document is the resolver
/// output and the base is the scanner output.
pub fn merge_spdx(
    base: &SpdxDocument,
    incoming: &SpdxDocument,
    policy: MergePolicy,
) -> Result<SpdxDocument> {
    let base_anchors = RelationshipGraph::new(&base.relationships)
        .anchors()
        .context("base SPDX document")?;
    let incoming_anchors = RelationshipGraph::new(&incoming.relationships)
        .anchors()
        .context("incoming SPDX document")?;

    // The incoming anchors are replaced by the base anchors.
    let incoming_packages: Vec<&SpdxPackage> = incoming
        .packages
        .iter()
        .filter(|p| p.spdx_id != incoming_anchors.root && p.spdx_id != incoming_anchors.middle)
        .collect();

    let PackageMerge {
        packages,
        base_aliases,
        incoming_aliases,
    } = match policy {
        MergePolicy::PreferAuthority => {
            merge_packages_preferring_authority(&base.packages, &incoming_packages, &base_anchors)?
        }
        MergePolicy::ApparentSameness => merge_packages_by_apparent_sameness(
            &base.packages,
            &incoming_packages,
            &base_anchors,
        ),
    };
    let packages = dedupe_by_spdx_id(packages);

    let rewriter = IdRewriter {
        base: &base_anchors,
        incoming: &incoming_anchors,
        base_aliases: &base_aliases,
        incoming_aliases: &incoming_aliases,
    };
    let declared = declared_elements(base);
    let relationships = merge_relationships(
        &base.relationships,
        &incoming.relationships,
        &rewriter,
        &packages,
        &declared,
    );
    let packages = prune_unreferenced(packages, &relationships);

    let mut merged = base.clone();
    merged.annotations = merge_document_annotations(base, incoming, &rewriter, &packages, &declared);
    merged.packages = packages;
    merged.relationships = relationships;
    merge_creators(&mut merged, incoming);

    log_unreachable(&merged, &base_anchors.root);
    tracing::info!(
        "Merged SPDX documents into {} packages and {} relationships",
        merged.packages.len(),
        merged.relationships.len()
    );
    Ok(merged)
}

// ============================================================================
// Packages
// ============================================================================

/// Merged package list plus, per input, old element ids mapped to new ones.
///
/// An id is aliased when its package was dropped as a duplicate of another,
/// or when an incoming package had to be renamed because the base already
/// uses its SPDXID for a different package.
struct PackageMerge {
    packages: Vec<SpdxPackage>,
    base_aliases: HashMap<String, String>,
    incoming_aliases: HashMap<String, String>,
}

/// Hands out SPDXIDs for incoming packages that collide with the base.
struct IdAllocator {
    /// Ids of the base side.
    taken: HashSet<String>,
    /// Every id in either input, plus those handed out so far.
    used: HashSet<String>,
}

impl IdAllocator {
    fn new(base: &[SpdxPackage], base_anchors: &Anchors, incoming: &[&SpdxPackage]) -> Self {
        let mut taken: HashSet<String> = base.iter().map(|p| p.spdx_id.clone()).collect();
        taken.insert(base_anchors.root.clone());
        taken.insert(base_anchors.middle.clone());
        let mut used = taken.clone();
        used.extend(incoming.iter().map(|p| p.spdx_id.clone()));
        Self { taken, used }
    }

    /// Rename `package` when its id is taken, recording the rename in
    /// `aliases`. A second incoming package with the same id reuses the
    /// earlier alias.
    fn claim(&mut self, package: &mut SpdxPackage, aliases: &mut HashMap<String, String>) {
        if !self.taken.contains(&package.spdx_id) {
            return;
        }
        if let Some(existing) = aliases.get(&package.spdx_id) {
            package.spdx_id.clone_from(existing);
            return;
        }
        let mut n = 1usize;
        let fresh = loop {
            let candidate = format!("{}-{n}", package.spdx_id);
            if !self.used.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        tracing::warn!(
            "SPDXID '{}' is used by a different package in both documents, renaming it to '{fresh}'",
            package.spdx_id
        );
        self.used.insert(fresh.clone());
        let old = std::mem::replace(&mut package.spdx_id, fresh.clone());
        aliases.insert(old, fresh);
    }
}

fn merge_packages_preferring_authority(
    scanner: &[SpdxPackage],
    authority: &[&SpdxPackage],
    base_anchors: &Anchors,
) -> Result<PackageMerge> {
    let mut survivors: Vec<SpdxPackage> = authority.iter().map(|p| (*p).clone()).collect();
    let filter = ScannerFilter::new(&survivors)?;
    let index = AuthorityIndex::new(&survivors)?;

    let mut packages = Vec::with_capacity(scanner.len() + survivors.len());
    let mut base_aliases = HashMap::new();
    for package in scanner {
        let is_anchor =
            package.spdx_id == base_anchors.root || package.spdx_id == base_anchors.middle;
        let reason = if is_anchor {
            None
        } else {
            filter.duplicate_reason(package)
        };
        let Some(reason) = reason else {
            packages.push(package.clone());
            continue;
        };

        tracing::debug!("Dropping scanner package '{}': {}", package.spdx_id, reason);
        if let Some(idx) = index.counterpart(package, reason) {
            let survivor = &mut survivors[idx];
            absorb(survivor, package);
            if survivor.spdx_id != package.spdx_id {
                base_aliases.insert(package.spdx_id.clone(), survivor.spdx_id.clone());
            }
        }
    }

    // Only ids of scanner packages that were kept can collide.
    let mut allocator = IdAllocator::new(&packages, base_anchors, authority);
    let mut incoming_aliases = HashMap::new();
    for survivor in &mut survivors {
        allocator.claim(survivor, &mut incoming_aliases);
    }
    for target in base_aliases.values_mut() {
        if let Some(renamed) = incoming_aliases.get(target.as_str()) {
            target.clone_from(renamed);
        }
    }

    packages.extend(survivors);
    Ok(PackageMerge {
        packages,
        base_aliases,
        incoming_aliases,
    })
}

fn merge_packages_by_apparent_sameness(
    base: &[SpdxPackage],
    incoming: &[&SpdxPackage],
    base_anchors: &Anchors,
) -> PackageMerge {
    let mut packages = base.to_vec();
    let mut by_key: HashMap<String, usize> = HashMap::new();
    for (idx, package) in packages.iter().enumerate() {
        for key in scanner_keys(package) {
            by_key.entry(key).or_insert(idx);
        }
    }
    let mut allocator = IdAllocator::new(base, base_anchors, incoming);
    let mut incoming_aliases = HashMap::new();

    for package in incoming {
        let keys = scanner_keys(*package);
        match keys.iter().find_map(|key| by_key.get(key).copied()) {
            Some(idx) => {
                let survivor = &mut packages[idx];
                absorb(survivor, package);
                if survivor.spdx_id != package.spdx_id {
                    incoming_aliases.insert(package.spdx_id.clone(), survivor.spdx_id.clone());
                }
            }
            None => {
                let idx = packages.len();
                for key in keys {
                    by_key.entry(key).or_insert(idx);
                }
                let mut package = (*package).clone();
                allocator.claim(&mut package, &mut incoming_aliases);
                packages.push(package);
            }
        }
    }
    PackageMerge {
        packages,
        base_aliases: HashMap::new(),
        incoming_aliases,
    }
}

/// Lookup of the authoritative package a scanner duplicate corresponds to.
struct AuthorityIndex {
    by_key: HashMap<String, usize>,
    by_name: HashMap<String, Vec<(usize, Option<String>)>>,
}

impl AuthorityIndex {
    fn new(authority: &[SpdxPackage]) -> Result<Self> {
        let mut by_key = HashMap::new();
        let mut by_name: HashMap<String, Vec<(usize, Option<String>)>> = HashMap::new();
        for (idx, package) in authority.iter().enumerate() {
            for key in authority_keys(package)? {
                by_key.entry(key).or_insert(idx);
            }
            by_name
                .entry(package.name.clone())
                .or_default()
                .push((idx, package.version_info.clone()));
        }
        Ok(Self { by_key, by_name })
    }

    /// Match by identity key, else by name with an equal or unset version.
    /// Non-registry duplicates are reported under a placeholder version, so
    /// any version matches for them.
    fn counterpart(&self, package: &SpdxPackage, reason: DuplicateReason) -> Option<usize> {
        let any_version = reason == DuplicateReason::NonRegistry;
        scanner_keys(package)
            .iter()
            .find_map(|key| self.by_key.get(key).copied())
            .or_else(|| {
                self.by_name.get(&package.name)?.iter().find_map(|(idx, version)| {
                    let matches = any_version
                        || version.is_none()
                        || version.as_deref() == package.item_version();
                    matches.then_some(*idx)
                })
            })
    }
}

/// Fold a duplicate's external references and annotations into the survivor.
fn absorb(survivor: &mut SpdxPackage, duplicate: &SpdxPackage) {
    survivor.external_refs = merge_external_refs(&survivor.external_refs, &duplicate.external_refs);
    survivor.annotations = merge_annotations(&survivor.annotations, &duplicate.annotations);
}

/// Union of two reference lists, sorted by category, type and locator.
///
/// Purl references that only differ in qualifiers or subpath count as the
/// same reference; the first one seen is kept.
#[must_use]
pub fn merge_external_refs(first: &[ExternalRef], second: &[ExternalRef]) -> Vec<ExternalRef> {
    let normalizer = PurlNormalizer::new();
    let mut unique: IndexMap<(String, String, String), ExternalRef> = IndexMap::new();
    for reference in first.iter().chain(second) {
        let locator = if reference.is_purl() {
            Purl::parse(&reference.reference_locator).map_or_else(
                |_| reference.reference_locator.to_lowercase(),
                |purl| normalizer.normalize_coarse(&purl),
            )
        } else {
            reference.reference_locator.to_lowercase()
        };
        let key = (
            reference.reference_category.to_lowercase(),
            reference.reference_type.to_lowercase(),
            locator,
        );
        unique.entry(key).or_insert_with(|| reference.clone());
    }

    let mut refs: Vec<ExternalRef> = unique.into_values().collect();
    refs.sort_by(|a, b| {
        (&a.reference_category, &a.reference_type, &a.reference_locator).cmp(&(
            &b.reference_category,
            &b.reference_type,
            &b.reference_locator,
        ))
    });
    refs
}

/// Union of two annotation lists, deduplicated on every field.
#[must_use]
pub fn merge_annotations(first: &[Annotation], second: &[Annotation]) -> Vec<Annotation> {
    first
        .iter()
        .chain(second)
        .cloned()
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

fn dedupe_by_spdx_id(packages: Vec<SpdxPackage>) -> Vec<SpdxPackage> {
    let mut seen = HashSet::new();
    packages
        .into_iter()
        .filter(|package| {
            let fresh = seen.insert(package.spdx_id.clone());
            if !fresh {
                tracing::warn!("Dropping second package with SPDXID '{}'", package.spdx_id);
            }
            fresh
        })
        .collect()
}

/// Remove packages that no relationship mentions.
#[must_use]
pub fn prune_unreferenced(packages: Vec<SpdxPackage>, relationships: &[Relationship]) -> Vec<SpdxPackage> {
    let referenced: HashSet<&str> = relationships
        .iter()
        .flat_map(|r| [r.spdx_element_id.as_str(), r.related_spdx_element.as_str()])
        .collect();
    let before = packages.len();
    let kept: Vec<SpdxPackage> = packages
        .into_iter()
        .filter(|p| referenced.contains(p.spdx_id.as_str()))
        .collect();
    if kept.len() < before {
        tracing::debug!("Pruned {} unreferenced packages", before - kept.len());
    }
    kept
}

// ============================================================================
// Relationships
// ============================================================================

/// Maps element ids of either input into the merged identity space.
struct IdRewriter<'a> {
    base: &'a Anchors,
    incoming: &'a Anchors,
    base_aliases: &'a HashMap<String, String>,
    incoming_aliases: &'a HashMap<String, String>,
}

impl IdRewriter<'_> {
    fn base_id(&self, id: &str) -> String {
        self.base_aliases
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    fn incoming_id(&self, id: &str) -> String {
        if id == self.incoming.root {
            self.base.root.clone()
        } else if id == self.incoming.middle {
            self.base.middle.clone()
        } else {
            self.incoming_aliases
                .get(id)
                .cloned()
                .unwrap_or_else(|| id.to_string())
        }
    }
}

/// Non-package elements the base document declares (files, snippets).
fn declared_elements(doc: &SpdxDocument) -> HashSet<String> {
    ["files", "snippets"]
        .iter()
        .filter_map(|key| doc.extra.get(*key).and_then(Value::as_array))
        .flatten()
        .filter_map(|element| element.get("SPDXID").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

fn merge_relationships(
    base: &[Relationship],
    incoming: &[Relationship],
    rewriter: &IdRewriter<'_>,
    packages: &[SpdxPackage],
    declared: &HashSet<String>,
) -> Vec<Relationship> {
    let package_ids: HashSet<&str> = packages.iter().map(|p| p.spdx_id.as_str()).collect();
    let anchors = rewriter.base;
    let is_anchor = |id: &str| id == anchors.root || id == anchors.middle;
    let known = |id: &str| package_ids.contains(id) || is_anchor(id);

    let mut merged: IndexSet<Relationship> = IndexSet::new();
    let mut dropped = 0usize;

    for edge in incoming {
        let is_own_describes = edge.relationship_type == RelationshipType::Describes
            && edge.spdx_element_id == rewriter.incoming.root
            && edge.related_spdx_element == rewriter.incoming.middle;
        if is_own_describes {
            continue;
        }

        let mut rewritten = edge.clone();
        rewritten.spdx_element_id = rewriter.incoming_id(&edge.spdx_element_id);
        rewritten.related_spdx_element = rewriter.incoming_id(&edge.related_spdx_element);
        // Only the base root describes the merged document.
        if rewritten.relationship_type == RelationshipType::Describes
            && rewritten.spdx_element_id == anchors.root
        {
            rewritten.spdx_element_id = anchors.middle.clone();
            rewritten.relationship_type = RelationshipType::Contains;
        }

        let source = rewritten.spdx_element_id.as_str();
        let target = rewritten.related_spdx_element.as_str();
        let retained = source != target
            && known(source)
            && known(target)
            && (package_ids.contains(source) || package_ids.contains(target));
        if retained {
            merged.insert(rewritten);
        } else {
            dropped += 1;
        }
    }

    for edge in base {
        let mut rewritten = edge.clone();
        rewritten.spdx_element_id = rewriter.base_id(&edge.spdx_element_id);
        rewritten.related_spdx_element = rewriter.base_id(&edge.related_spdx_element);

        let source = rewritten.spdx_element_id.as_str();
        let target = rewritten.related_spdx_element.as_str();
        let retained = source != target
            && (known(source) || declared.contains(source))
            && (package_ids.contains(target) || target == anchors.middle || declared.contains(target));
        if retained {
            merged.insert(rewritten);
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        tracing::debug!("Dropped {dropped} relationships referencing removed elements");
    }
    merged.into_iter().collect()
}

// ============================================================================
// Document-level data
// ============================================================================

fn merge_document_annotations(
    base: &SpdxDocument,
    incoming: &SpdxDocument,
    rewriter: &IdRewriter<'_>,
    packages: &[SpdxPackage],
    declared: &HashSet<String>,
) -> Vec<DocumentAnnotation> {
    let mut surviving: HashSet<&str> = packages.iter().map(|p| p.spdx_id.as_str()).collect();
    surviving.insert(base.spdx_id.as_str());
    surviving.insert(rewriter.base.root.as_str());
    surviving.extend(declared.iter().map(String::as_str));

    let rebased = base.annotations.iter().map(|a| DocumentAnnotation {
        spdx_element_id: a.spdx_element_id.as_deref().map(|id| rewriter.base_id(id)),
        annotation: a.annotation.clone(),
    });
    let carried = incoming.annotations.iter().map(|a| DocumentAnnotation {
        spdx_element_id: a.spdx_element_id.as_deref().map(|id| rewriter.incoming_id(id)),
        annotation: a.annotation.clone(),
    });

    // Annotations on the document itself always survive.
    rebased
        .chain(carried)
        .filter(|a| {
            a.spdx_element_id
                .as_deref()
                .map_or(true, |id| surviving.contains(id))
        })
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

/// Append the incoming document's creators that the base does not list yet.
fn merge_creators(merged: &mut SpdxDocument, incoming: &SpdxDocument) {
    let Some(incoming_info) = incoming.creation_info.as_ref() else {
        return;
    };
    let info = merged.creation_info.get_or_insert_with(Default::default);
    for creator in &incoming_info.creators {
        if !info.creators.contains(creator) {
            info.creators.push(creator.clone());
        }
    }
}

fn log_unreachable(doc: &SpdxDocument, root: &str) {
    let graph = RelationshipGraph::new(&doc.relationships);
    let reachable = graph.reachable_from(root);
    let unreachable = doc
        .packages
        .iter()
        .filter(|p| !reachable.contains(p.spdx_id.as_str()))
        .count();
    if unreachable > 0 {
        tracing::debug!("{unreachable} packages are not reachable from '{root}'");
    }
}
