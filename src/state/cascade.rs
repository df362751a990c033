//! Dependent selection fields
//!
//! A cascade is an ordered chain of selection links where each link's
//! options are fetched using the value selected in the link above it.
//! Changing a link clears everything below it; responses that arrive for
//! a value that is no longer selected are dropped.

use crate::api::ApiError;
use crate::state::{FormRecord, OptionItem};
use serde_json::Value;

/// Which grouping a client organizes its students by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupFlow {
    Program,
    Batch,
}

impl GroupFlow {
    /// Key the selected group is submitted under
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Program => "program",
            Self::Batch => "batch",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Program => "Program",
            Self::Batch => "Batch",
        }
    }
}

/// Where a link's options come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionSource {
    Clients,
    Countries,
    States,
    Cities,
    /// Programs or batches of a client, decided by its settings
    ClientGroups,
    Courses(GroupFlow),
    /// Nothing to fetch until an upstream response says what this link is
    Unavailable,
}

/// Options returned for a link, plus the grouping flow when the source
/// was [`OptionSource::ClientGroups`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedOptions {
    pub options: Vec<OptionItem>,
    pub flow: Option<GroupFlow>,
}

impl LoadedOptions {
    pub fn plain(options: Vec<OptionItem>) -> Self {
        Self {
            options,
            flow: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeKind {
    /// client → program | batch → course
    Organization,
    /// country → state → city
    Location,
}

/// A fetch the caller must perform to populate `level`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionRequest {
    pub cascade: CascadeKind,
    pub level: usize,
    pub source: OptionSource,
    /// Upstream value the fetch is keyed by; `None` for the first link
    pub key: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionLink {
    pub field: String,
    pub label: String,
    pub source: OptionSource,
    pub options: Vec<OptionItem>,
    pub selected: Option<i64>,
    pub loading: bool,
}

impl SelectionLink {
    fn new(field: &str, label: &str, source: OptionSource) -> Self {
        Self {
            field: field.to_string(),
            label: label.to_string(),
            source,
            options: Vec::new(),
            selected: None,
            loading: false,
        }
    }

    fn clear(&mut self) {
        self.options.clear();
        self.selected = None;
        self.loading = false;
    }

    pub fn selected_label(&self) -> Option<&str> {
        let id = self.selected?;
        self.options
            .iter()
            .find(|o| o.id == id)
            .map(|o| o.label.as_str())
    }

    /// Option `step` places away from the current one, wrapping
    pub fn cycle(&self, step: isize) -> Option<i64> {
        if self.options.is_empty() {
            return None;
        }
        let len = self.options.len() as isize;
        let next = match self
            .selected
            .and_then(|id| self.options.iter().position(|o| o.id == id))
        {
            Some(pos) => (pos as isize + step).rem_euclid(len),
            None if step < 0 => len - 1,
            None => 0,
        };
        self.options.get(next as usize).map(|o| o.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionCascade {
    kind: CascadeKind,
    links: Vec<SelectionLink>,
    flow: Option<GroupFlow>,
    locked: bool,
}

impl SelectionCascade {
    /// client → program | batch → course
    pub fn organization() -> Self {
        Self::with_links(
            CascadeKind::Organization,
            vec![
                SelectionLink::new("client_id", "Client", OptionSource::Clients),
                SelectionLink::new("program", "Program / Batch", OptionSource::ClientGroups),
                SelectionLink::new("course", "Course", OptionSource::Unavailable),
            ],
        )
    }

    /// Client picker on its own
    pub fn client_only() -> Self {
        Self::with_links(
            CascadeKind::Organization,
            vec![SelectionLink::new("client_id", "Client", OptionSource::Clients)],
        )
    }

    /// country → state → city
    pub fn location() -> Self {
        Self::with_links(
            CascadeKind::Location,
            vec![
                SelectionLink::new("country", "Country", OptionSource::Countries),
                SelectionLink::new("state", "State", OptionSource::States),
                SelectionLink::new("city", "City", OptionSource::Cities),
            ],
        )
    }

    fn with_links(kind: CascadeKind, links: Vec<SelectionLink>) -> Self {
        Self {
            kind,
            links,
            flow: None,
            locked: false,
        }
    }

    pub fn kind(&self) -> CascadeKind {
        self.kind
    }

    pub fn links(&self) -> &[SelectionLink] {
        &self.links
    }

    pub fn link(&self, level: usize) -> Option<&SelectionLink> {
        self.links.get(level)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Grouping flow reported for the selected client, once known
    pub fn flow(&self) -> Option<GroupFlow> {
        self.flow
    }

    /// Whether the first link is pinned and cannot be changed
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn selected(&self, level: usize) -> Option<i64> {
        self.links.get(level).and_then(|l| l.selected)
    }

    pub fn is_loading(&self) -> bool {
        self.links.iter().any(|l| l.loading)
    }

    /// Fetch for the first link, issued when the form opens
    pub fn root_request(&mut self) -> Option<OptionRequest> {
        if self.locked {
            return None;
        }
        let link = self.links.first_mut()?;
        link.loading = true;
        Some(OptionRequest {
            cascade: self.kind,
            level: 0,
            source: link.source,
            key: None,
        })
    }

    /// Pin the first link to a single known option, returning the fetch
    /// for the next link
    pub fn lock_root(&mut self, option: OptionItem) -> Option<OptionRequest> {
        let id = option.id;
        let root = self.links.first_mut()?;
        root.options = vec![option];
        root.loading = false;
        self.locked = true;
        self.set_selection(0, Some(id))
    }

    /// User-initiated change; ignored on a locked first link
    pub fn on_upstream_change(&mut self, level: usize, value: Option<i64>) -> Option<OptionRequest> {
        if level == 0 && self.locked {
            return None;
        }
        self.set_selection(level, value)
    }

    fn set_selection(&mut self, level: usize, value: Option<i64>) -> Option<OptionRequest> {
        let link = self.links.get_mut(level)?;
        link.selected = value;

        for downstream in self.links.iter_mut().skip(level + 1) {
            downstream.clear();
        }
        if self.kind == CascadeKind::Organization && level == 0 {
            self.reset_groups();
        }

        let key = value?;
        let next = self.links.get_mut(level + 1)?;
        if next.source == OptionSource::Unavailable {
            return None;
        }
        next.loading = true;
        Some(OptionRequest {
            cascade: self.kind,
            level: level + 1,
            source: next.source,
            key: Some(key),
        })
    }

    fn reset_groups(&mut self) {
        self.flow = None;
        if let Some(group) = self.links.get_mut(1) {
            group.field = "program".to_string();
            group.label = "Program / Batch".to_string();
        }
        if let Some(course) = self.links.get_mut(2) {
            course.source = OptionSource::Unavailable;
        }
    }

    /// Install a fetch result. Returns false when the result is stale.
    pub fn apply(&mut self, request: &OptionRequest, result: Result<LoadedOptions, ApiError>) -> bool {
        if !self.is_current(request) {
            tracing::debug!(
                cascade = ?request.cascade,
                level = request.level,
                key = ?request.key,
                "discarding stale options response"
            );
            return false;
        }

        match result {
            Ok(loaded) => {
                if let Some(flow) = loaded.flow {
                    self.flow = Some(flow);
                    if let Some(link) = self.links.get_mut(request.level) {
                        link.field = flow.field_name().to_string();
                        link.label = flow.label().to_string();
                    }
                    if let Some(next) = self.links.get_mut(request.level + 1) {
                        next.source = OptionSource::Courses(flow);
                    }
                }
                if let Some(link) = self.links.get_mut(request.level) {
                    if link
                        .selected
                        .is_some_and(|id| !loaded.options.iter().any(|o| o.id == id))
                    {
                        link.selected = None;
                    }
                    link.options = loaded.options;
                    link.loading = false;
                }
            }
            Err(err) => {
                tracing::warn!(
                    cascade = ?request.cascade,
                    level = request.level,
                    error = %err,
                    "failed to load options"
                );
                if let Some(link) = self.links.get_mut(request.level) {
                    link.options.clear();
                    link.loading = false;
                }
            }
        }
        true
    }

    fn is_current(&self, request: &OptionRequest) -> bool {
        if request.cascade != self.kind {
            return false;
        }
        let Some(link) = self.links.get(request.level) else {
            return false;
        };
        if link.source != request.source || !link.loading {
            return false;
        }
        match request.level {
            0 => request.key.is_none(),
            n => self.links[n - 1].selected == request.key && request.key.is_some(),
        }
    }

    /// Write every link's selection into the record, `null` when unset
    pub fn record_into(&self, record: &mut FormRecord) {
        for (level, link) in self.links.iter().enumerate() {
            // the group link has no name until the client's flow is known
            if self.kind == CascadeKind::Organization && level == 1 && self.flow.is_none() {
                continue;
            }
            let value = link.selected.map(Value::from).unwrap_or(Value::Null);
            record.insert(link.field.clone(), value);
        }
    }
}
