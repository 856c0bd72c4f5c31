//! Uniform find capability over the two kinds of search target.
//!
//! Window contents expose their result notifications as a direct listener;
//! embedded frames are recognised by their element tag and deliver results
//! through element events. The kind is decided once by
//! [`TargetCapability::classify`] and never looked at again.
use crate::host::{ElementEvent, FoundListener, SearchTarget};
use inpage_common::Result;
use inpage_common::protocol::{FindOptions, RequestId, StopFindAction};
use std::sync::Arc;

const EMBEDDED_TAG: &str = "WEBVIEW";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// A full window's content.
    Content,
    /// An embeddable content frame living in the document.
    Embedded,
}

pub struct ContentSurfaceCapability {
    target: Arc<dyn SearchTarget>,
}

pub struct EmbeddedSurfaceCapability {
    target: Arc<dyn SearchTarget>,
}

/// The resolved capability object a session searches through.
pub enum TargetCapability {
    Content(ContentSurfaceCapability),
    Embedded(EmbeddedSurfaceCapability),
}

impl TargetCapability {
    pub fn classify(target: Arc<dyn SearchTarget>) -> Self {
        let embedded = target
            .tag_name()
            .is_some_and(|tag| tag.eq_ignore_ascii_case(EMBEDDED_TAG));
        if embedded {
            TargetCapability::Embedded(EmbeddedSurfaceCapability { target })
        } else {
            TargetCapability::Content(ContentSurfaceCapability { target })
        }
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            TargetCapability::Content(_) => TargetKind::Content,
            TargetCapability::Embedded(_) => TargetKind::Embedded,
        }
    }

    fn target(&self) -> &dyn SearchTarget {
        match self {
            TargetCapability::Content(c) => c.target.as_ref(),
            TargetCapability::Embedded(e) => e.target.as_ref(),
        }
    }

    pub fn find(&self, query: &str, options: FindOptions) -> RequestId {
        self.target().find_in_page(query, options)
    }

    pub fn stop_find(&self, action: StopFindAction) {
        self.target().stop_find_in_page(action);
    }

    /// Route every result notification of the target into `on_result`.
    pub fn subscribe(&self, on_result: FoundListener) -> Result<()> {
        match self {
            TargetCapability::Content(c) => c.target.on_found_in_page(on_result),
            TargetCapability::Embedded(e) => {
                e.target.add_event_listener(Box::new(move |event| {
                    if let ElementEvent::FoundInPage(result) = event {
                        on_result(result.clone());
                    }
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryContents, MemoryWebview};
    use inpage_common::protocol::FoundInPageResult;
    use parking_lot::Mutex;

    fn collector() -> (Arc<Mutex<Vec<FoundInPageResult>>>, FoundListener) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, Box::new(move |r| sink.lock().push(r)))
    }

    #[test]
    fn window_contents_classify_as_content() {
        let cap = TargetCapability::classify(Arc::new(MemoryContents::new("foo")));
        assert_eq!(cap.kind(), TargetKind::Content);
    }

    #[test]
    fn webview_tag_classifies_as_embedded() {
        let cap = TargetCapability::classify(Arc::new(MemoryWebview::new("foo")));
        assert_eq!(cap.kind(), TargetKind::Embedded);
    }

    #[test]
    fn both_kinds_deliver_results_through_subscribe() {
        for target in [
            Arc::new(MemoryContents::new("foo bar foo")) as Arc<dyn SearchTarget>,
            Arc::new(MemoryWebview::new("foo bar foo")) as Arc<dyn SearchTarget>,
        ] {
            let cap = TargetCapability::classify(target);
            let (seen, listener) = collector();
            cap.subscribe(listener).unwrap();

            let id = cap.find("foo", FindOptions::default());
            let seen = seen.lock();
            let last = seen.last().expect("final update delivered");
            assert_eq!(last.request_id, id);
            assert_eq!(last.matches, Some(2));
            assert!(last.final_update);
        }
    }
}
