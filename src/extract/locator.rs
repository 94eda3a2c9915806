//! Locating per-file regions and resolving their paths.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{ElementRef, Html};
use tracing::debug;

use super::probe::{attr, has_any_class, trimmed_text, ProbeChain, Scope};

pub(crate) static FILE_REGION_PROBES: LazyLock<ProbeChain> = LazyLock::new(|| {
    ProbeChain::new(
        "file-region",
        &[
            ".file",
            ".js-file",
            "[data-file-type]",
            ".js-details-container",
            ".js-file-content",
            ".diff-view",
            ".js-diff-table",
            ".diff-table",
            "[id^='diff-']",
            ".js-diff-progressive-container",
            ".js-diff-progressive-container .js-file",
        ],
    )
});

pub(crate) static FILE_HEADER_PROBES: LazyLock<ProbeChain> = LazyLock::new(|| {
    ProbeChain::new(
        "file-header",
        &[".file-header, .js-file-header, [data-path], .js-file-header-path"],
    )
});

static FILE_CONTAINER: LazyLock<ProbeChain> = LazyLock::new(|| {
    ProbeChain::new(
        "file-container",
        &[".file, .js-file, [data-file-type], .js-details-container"],
    )
});

static DIFF_TABLE_PROBES: LazyLock<ProbeChain> = LazyLock::new(|| {
    ProbeChain::new("diff-table", &[".diff-table, table.js-file-line-container"])
});

static DIFF_ROOT_PROBES: LazyLock<ProbeChain> = LazyLock::new(|| {
    ProbeChain::new(
        "diff-root",
        &["#files", ".js-diff-progressive-container", ".diff-view", "#diff-content"],
    )
});

/// Attribute carriers, each paired with the attribute holding the path.
const PATH_ATTRIBUTE_PROBES: &[(&str, &str)] = &[
    ("[data-path]", "data-path"),
    ("[data-tagsearch-path]", "data-tagsearch-path"),
    ("[data-file-path]", "data-file-path"),
    ("a[title]", "title"),
];

static PATH_ATTRIBUTE_CHAINS: LazyLock<Vec<(ProbeChain, &'static str)>> = LazyLock::new(|| {
    PATH_ATTRIBUTE_PROBES
        .iter()
        .map(|(spec, attribute)| (ProbeChain::new("path-attribute", &[*spec]), *attribute))
        .collect()
});

static PATH_TEXT_PROBES: LazyLock<ProbeChain> = LazyLock::new(|| {
    ProbeChain::new(
        "path-text",
        &[
            ".file-header .file-info a",
            ".js-file-header .file-info a",
            ".js-file-header-path",
            ".file-info a",
            ".js-file-header a",
        ],
    )
});

static ANY_ELEMENT: LazyLock<ProbeChain> = LazyLock::new(|| ProbeChain::new("any", &["*"]));

const OWN_PATH_ATTRIBUTES: &[&str] = &["data-path", "data-tagsearch-path", "data-file-path"];

/// Elements whose text is never a file path: icons, comment bodies, controls,
/// and anything holding code or line numbers.
const NON_PATH_TAGS: &[&str] = &["button", "svg", "script", "style", "td", "pre", "code"];
const NON_PATH_CLASSES: &[&str] = &[
    "octicon",
    "js-comment-body",
    "blob-code",
    "blob-code-inner",
    "blob-num",
    "js-file-line",
];

/// How a file region was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionStrategy {
    /// A file-region probe matched; `index` is its rank.
    Probe { index: usize, spec: &'static str },
    /// Enclosing container of a file header element.
    HeaderAncestor,
    /// A bare diff table.
    DiffTable,
    /// The whole diff container, treated as a single file.
    PseudoFile,
}

#[derive(Debug, Clone, Copy)]
pub struct FileRegion<'a> {
    pub element: ElementRef<'a>,
    pub strategy: RegionStrategy,
}

/// Find one region per file, trying progressively looser strategies.
///
/// Returns an empty list only when the page has nothing diff-shaped at all.
pub fn locate_file_regions(html: &Html) -> Vec<FileRegion<'_>> {
    let scope = Scope::Document(html);

    if let Some(hit) = FILE_REGION_PROBES.first_match(scope) {
        let strategy = RegionStrategy::Probe {
            index: hit.index,
            spec: hit.spec,
        };
        return hit
            .elements
            .into_iter()
            .map(|element| FileRegion { element, strategy })
            .collect();
    }

    if let Some(hit) = FILE_HEADER_PROBES.first_match(scope) {
        let mut seen = HashSet::new();
        let regions: Vec<_> = hit
            .elements
            .into_iter()
            .filter_map(enclosing_container)
            .filter(|container| seen.insert(container.id()))
            .map(|element| FileRegion {
                element,
                strategy: RegionStrategy::HeaderAncestor,
            })
            .collect();
        if !regions.is_empty() {
            debug!(count = regions.len(), "file regions from header ancestors");
            return regions;
        }
    }

    if let Some(hit) = DIFF_TABLE_PROBES.first_match(scope) {
        debug!(count = hit.elements.len(), "file regions from bare diff tables");
        return hit
            .elements
            .into_iter()
            .map(|element| FileRegion {
                element,
                strategy: RegionStrategy::DiffTable,
            })
            .collect();
    }

    match DIFF_ROOT_PROBES.select_first(scope) {
        Some(element) => {
            debug!("treating top-level diff container as a single file");
            vec![FileRegion {
                element,
                strategy: RegionStrategy::PseudoFile,
            }]
        }
        None => {
            debug!("no diff-shaped content found");
            Vec::new()
        }
    }
}

/// Nearest file container around a header, or the header's parent element.
pub(crate) fn enclosing_container(header: ElementRef<'_>) -> Option<ElementRef<'_>> {
    FILE_CONTAINER
        .closest(header)
        .or_else(|| header.parent().and_then(ElementRef::wrap))
}

/// Path named by a header element: its `data-path`, else its text.
pub(crate) fn header_path(header: ElementRef<'_>) -> Option<String> {
    attr(header, "data-path")
        .map(str::to_string)
        .or_else(|| Some(trimmed_text(header)))
        .filter(|p| is_path_shaped(p))
}

/// Resolve the path for a region, or an `unknown-file-*` placeholder.
pub fn resolve_file_path(region: ElementRef<'_>) -> String {
    match resolved_path(region) {
        Some(path) => path,
        None => {
            let placeholder = placeholder_path();
            debug!(path = %placeholder, "no path found for file region");
            placeholder
        }
    }
}

/// Resolved path without the placeholder fallback.
pub(crate) fn resolved_path(region: ElementRef<'_>) -> Option<String> {
    path_candidates(region)
        .into_iter()
        .next()
        .or_else(|| leaf_scan(region))
}

/// Every attribute- and link-derived path candidate, highest priority first.
///
/// One candidate per probe: the first path-shaped value that probe yields.
pub(crate) fn path_candidates(region: ElementRef<'_>) -> Vec<String> {
    let mut candidates = Vec::new();

    for name in OWN_PATH_ATTRIBUTES {
        if let Some(value) = attr(region, name).filter(|v| is_path_shaped(v)) {
            candidates.push(value.to_string());
        }
    }

    for (chain, attribute) in PATH_ATTRIBUTE_CHAINS.iter() {
        for probe in chain.probes() {
            let found = region
                .select(probe.selector())
                .filter_map(|el| attr(el, attribute))
                .find(|v| is_path_shaped(v));
            if let Some(value) = found {
                candidates.push(value.to_string());
            }
        }
    }

    for probe in PATH_TEXT_PROBES.probes() {
        let found = region
            .select(probe.selector())
            .map(trimmed_text)
            .find(|t| is_path_shaped(t));
        if let Some(text) = found {
            candidates.push(text);
        }
    }

    candidates
}

/// Last resort: the first leaf element whose whole text looks like a path.
fn leaf_scan(region: ElementRef<'_>) -> Option<String> {
    ANY_ELEMENT
        .probes()
        .iter()
        .flat_map(|probe| region.select(probe.selector()))
        .filter(|el| !el.children().any(|child| child.value().is_element()))
        .filter(|el| !is_excluded(*el, region))
        .map(trimmed_text)
        .find(|text| is_path_shaped(text))
}

fn is_excluded(el: ElementRef<'_>, region: ElementRef<'_>) -> bool {
    std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .take_while(|node| node.id() != region.id())
        .any(|node| {
            NON_PATH_TAGS.contains(&node.value().name()) || has_any_class(node, NON_PATH_CLASSES)
        })
}

/// Non-empty, no whitespace, contains `.` or `/`, at least one letter, and
/// only characters that appear in repository paths.
pub(crate) fn is_path_shaped(text: &str) -> bool {
    !text.is_empty()
        && text.len() <= 512
        && (text.contains('.') || text.contains('/'))
        && text.chars().any(|c| c.is_alphabetic())
        && !text.starts_with(['+', '-'])
        && text
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | '/' | '@' | '~' | '+'))
}

fn placeholder_path() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("unknown-file-{}", &id[..8])
}
