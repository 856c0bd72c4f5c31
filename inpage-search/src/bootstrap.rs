//! Factory building a ready-to-use [`InPageSearch`] from settings.
use crate::host::{Document, ElementContainer, ElementEvent, OverlayElement, SearchTarget};
use crate::session::{InPageSearch, SessionMailbox};
use inpage_common::{InPageError, Result};
use inpage_config::SearchSettings;
use std::path::Path;
use std::sync::{Arc, Weak};
use tracing::{debug, info};
use url::Url;

/// Class set on overlays created by [`search_in_page`].
pub const SEARCH_WINDOW_CLASS: &str = "inpage-search-window";

/// Settings plus the host objects that cannot come from a settings file.
#[derive(Default)]
pub struct InPageSearchOptions {
    pub settings: SearchSettings,
    /// Use this overlay instead of creating one.
    pub search_window: Option<Arc<dyn OverlayElement>>,
    /// Attach the overlay here instead of the document body.
    pub search_window_parent: Option<Arc<dyn ElementContainer>>,
}

impl InPageSearchOptions {
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn with_search_window(mut self, overlay: Arc<dyn OverlayElement>) -> Self {
        self.search_window = Some(overlay);
        self
    }

    pub fn with_parent(mut self, parent: Arc<dyn ElementContainer>) -> Self {
        self.search_window_parent = Some(parent);
        self
    }
}

/// Build a search session for `target`.
///
/// Creates and styles an overlay when none is given, points it at the search
/// window document, injects the stylesheet and agent script once the overlay
/// is ready, and initializes eagerly when `preload_search_window` is set.
///
/// ```
/// use inpage_search::bootstrap::{search_in_page, InPageSearchOptions};
/// use inpage_search::memory::{MemoryContents, MemoryDocument};
/// use inpage_search::session::{SessionInput, SessionMailbox};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// struct Discard;
/// impl SessionMailbox for Discard {
///     fn post(&self, _: SessionInput) {}
///     fn post_after(&self, _: SessionInput, _: Duration) {}
/// }
///
/// let document = MemoryDocument::new();
/// let search = search_in_page(
///     Arc::new(MemoryContents::new("foo bar")),
///     InPageSearchOptions::default(),
///     &document,
///     Arc::new(Discard),
/// )
/// .unwrap();
/// assert!(!search.is_open());
/// assert_eq!(document.body_children(), 0);
/// ```
pub fn search_in_page(
    target: Arc<dyn SearchTarget>,
    options: InPageSearchOptions,
    document: &dyn Document,
    mailbox: Arc<dyn SessionMailbox>,
) -> Result<InPageSearch> {
    let InPageSearchOptions {
        settings,
        search_window,
        search_window_parent,
    } = options;

    let overlay = match search_window {
        Some(overlay) => overlay,
        None => {
            let overlay = document.create_overlay();
            overlay.add_class(SEARCH_WINDOW_CLASS);
            overlay.set_attribute("nodeintegration", "");
            overlay.set_style("outline", "0");
            overlay
        }
    };

    if overlay.src().is_none_or(|src| src.is_empty()) {
        let src = file_url(&settings.search_window_html())?;
        debug!(target: "inpage.bootstrap", %src, "search window source");
        overlay.set_src(src.as_str());
    }

    let script = injection_script(
        &file_url(&settings.stylesheet())?,
        &file_url(&settings.agent_script())?,
    );
    when_ready(&overlay, move |o| o.execute_script(&script));

    if settings.open_devtools_of_search_window {
        when_ready(&overlay, |o| o.open_devtools());
    }

    let parent = search_window_parent.unwrap_or_else(|| document.body());
    let mut search = InPageSearch::new(overlay, parent, target, mailbox, settings.verbose);
    if settings.preload_search_window {
        search.initialize()?;
    }
    info!(
        target: "inpage.bootstrap",
        kind = ?search.target_kind(),
        preload = settings.preload_search_window,
        "search session created"
    );
    Ok(search)
}

/// `file://` URL for a possibly relative local path.
pub fn file_url(path: &Path) -> Result<Url> {
    let absolute = std::path::absolute(path)
        .map_err(|e| InPageError::Config(format!("cannot resolve {}: {e}", path.display())))?;
    Url::from_file_path(&absolute)
        .map_err(|()| InPageError::Config(format!("not a file path: {}", absolute.display())))
}

/// Script adding the stylesheet link and the agent script to the overlay document.
fn injection_script(css: &Url, agent: &Url) -> String {
    let css = serde_json::Value::from(css.as_str()).to_string();
    let agent = serde_json::Value::from(agent.as_str()).to_string();
    format!(
        "(function(){{\n\
         const l = document.createElement('link');\n\
         l.rel = 'stylesheet';\n\
         l.href = {css};\n\
         document.head.appendChild(l);\n\
         const s = document.createElement('script');\n\
         s.src = {agent};\n\
         document.body.appendChild(s);\n\
         }})()"
    )
}

/// Run `f` now if the overlay is ready, otherwise every time it reports `DomReady`.
fn when_ready<F>(overlay: &Arc<dyn OverlayElement>, f: F)
where
    F: Fn(&dyn OverlayElement) + Send + Sync + 'static,
{
    if overlay.is_ready() {
        f(overlay.as_ref());
        return;
    }
    let weak: Weak<dyn OverlayElement> = Arc::downgrade(overlay);
    overlay.add_event_listener(Box::new(move |event| {
        if matches!(event, ElementEvent::DomReady) {
            if let Some(overlay) = weak.upgrade() {
                f(overlay.as_ref());
            }
        }
    }));
}
