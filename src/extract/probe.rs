//! Ordered selector probes and the "first match wins" routine.
//!
//! Host markup has changed shape several times, so every concern (file
//! containers, paths, rows, line numbers) is described as a ranked list of
//! CSS selectors. A chain is evaluated front to back and the first probe
//! that yields at least one element decides the result; later probes are
//! never consulted.

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

/// A single compiled selector with the spec it came from.
#[derive(Debug)]
pub struct Probe {
    spec: &'static str,
    selector: Selector,
}

impl Probe {
    pub fn spec(&self) -> &'static str {
        self.spec
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }
}

/// Where a probe is evaluated: the whole document or below one element.
#[derive(Clone, Copy)]
pub enum Scope<'a> {
    Document(&'a Html),
    Element(ElementRef<'a>),
}

impl<'a> Scope<'a> {
    /// All matches in document order. Element scopes exclude the element itself.
    pub fn select_all(self, selector: &Selector) -> Vec<ElementRef<'a>> {
        match self {
            Scope::Document(html) => html.select(selector).collect(),
            Scope::Element(el) => el.select(selector).collect(),
        }
    }

    pub fn select_first(self, selector: &Selector) -> Option<ElementRef<'a>> {
        match self {
            Scope::Document(html) => html.select(selector).next(),
            Scope::Element(el) => el.select(selector).next(),
        }
    }
}

/// Elements produced by the winning probe of a chain.
#[derive(Debug)]
pub struct ProbeHit<'a> {
    /// Position of the winning probe in its chain.
    pub index: usize,
    pub spec: &'static str,
    pub elements: Vec<ElementRef<'a>>,
}

/// A named, ordered list of probes.
#[derive(Debug)]
pub struct ProbeChain {
    name: &'static str,
    probes: Vec<Probe>,
}

impl ProbeChain {
    /// Compile a chain. Specs that fail to parse are dropped with a warning.
    pub fn new(name: &'static str, specs: &[&'static str]) -> Self {
        let probes = specs
            .iter()
            .filter_map(|spec| match Selector::parse(spec) {
                Ok(selector) => Some(Probe { spec, selector }),
                Err(e) => {
                    warn!(chain = name, spec, error = ?e, "skipping invalid probe");
                    None
                }
            })
            .collect();
        Self { name, probes }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn probes(&self) -> &[Probe] {
        &self.probes
    }

    /// Evaluate probes in order; the first with any match wins.
    pub fn first_match<'a>(&self, scope: Scope<'a>) -> Option<ProbeHit<'a>> {
        let (index, elements) = first_hit(&self.probes, |probe| scope.select_all(&probe.selector))?;
        let spec = self.probes[index].spec;
        debug!(chain = self.name, probe = spec, count = elements.len(), "probe matched");
        Some(ProbeHit {
            index,
            spec,
            elements,
        })
    }

    /// First element of the first probe that matches anything.
    pub fn select_first<'a>(&self, scope: Scope<'a>) -> Option<ElementRef<'a>> {
        self.probes
            .iter()
            .find_map(|probe| scope.select_first(&probe.selector))
    }

    /// Whether any probe in the chain matches `el` itself.
    pub fn matches(&self, el: &ElementRef<'_>) -> bool {
        self.probes.iter().any(|probe| probe.selector.matches(el))
    }

    /// Nearest element, starting at `el` and walking up, that the chain matches.
    pub fn closest<'a>(&self, el: ElementRef<'a>) -> Option<ElementRef<'a>> {
        std::iter::once(el)
            .chain(el.ancestors().filter_map(ElementRef::wrap))
            .find(|candidate| self.matches(candidate))
    }
}

/// Generic "first probe with at least one result wins" evaluation.
///
/// Returns the index of the winning probe and its results. `eval` is not
/// called for any probe after the winner.
pub fn first_hit<P, T>(probes: &[P], mut eval: impl FnMut(&P) -> Vec<T>) -> Option<(usize, Vec<T>)> {
    for (index, probe) in probes.iter().enumerate() {
        let found = eval(probe);
        if !found.is_empty() {
            return Some((index, found));
        }
    }
    None
}

// ── Small DOM helpers shared by the extractor and the placement resolver ──

/// Concatenated descendant text, trimmed.
pub fn trimmed_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Attribute value, trimmed; `None` when absent or blank.
pub fn attr<'a>(el: ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value().attr(name).map(str::trim).filter(|v| !v.is_empty())
}

pub fn has_any_class(el: ElementRef<'_>, classes: &[&str]) -> bool {
    el.value().classes().any(|c| classes.contains(&c))
}

pub fn parse_line_number(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|n| *n > 0)
}
