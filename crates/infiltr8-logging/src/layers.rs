//! Custom tracing layers

use tracing::{Subscriber, span};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::format::{Format, Json, JsonFields};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::{LookupSpan, SpanRef};

use crate::config::JsonlConfig;
use crate::context::{PlayerContextData, PlayerContextGuard};

/// Layer that attaches the active player context to new spans
///
/// Spans opened while a [`PlayerContextGuard`] is alive carry a
/// [`PlayerContextExtension`], so later layers can attribute them even
/// when the span is entered on another thread.
pub struct PlayerContextLayer;

impl PlayerContextLayer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlayerContextLayer {
    fn default() -> Self {
        Self::new()
    }
}

/// Extension data stored on spans
#[derive(Debug, Clone)]
pub struct PlayerContextExtension {
    pub data: PlayerContextData,
}

impl<S> Layer<S> for PlayerContextLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_new_span(&self, _attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        // Inherit from the parent span when no guard is active on this thread
        let data = PlayerContextGuard::current().or_else(|| {
            span.parent()
                .and_then(|parent| player_context(&parent))
        });
        if let Some(data) = data {
            span.extensions_mut().insert(PlayerContextExtension { data });
        }
    }
}

/// The player context recorded on a span, if any
pub fn player_context<'a, S>(span: &SpanRef<'a, S>) -> Option<PlayerContextData>
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    span.extensions()
        .get::<PlayerContextExtension>()
        .map(|ext| ext.data.clone())
}

/// A JSONL formatting layer writing to `writer`
pub fn jsonl_layer<S, W>(
    writer: W,
    config: &JsonlConfig,
) -> tracing_subscriber::fmt::Layer<S, JsonFields, Format<Json>, W>
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(config.include_current_span)
        .with_span_list(config.include_spans)
        .flatten_event(config.flatten_events)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_thread_ids(config.include_thread_info)
        .with_thread_names(config.include_thread_info)
        .with_writer(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use infiltr8_core::UserId;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::layer::SubscriberExt;

    /// Records the player attached to every new span
    #[derive(Clone, Default)]
    struct SpanRecorder {
        seen: Arc<Mutex<Vec<(String, Option<UserId>)>>>,
    }

    impl<S> Layer<S> for SpanRecorder
    where
        S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    {
        fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
            let span = ctx.span(id).unwrap();
            let player = player_context(&span).map(|data| data.player);
            self.seen
                .lock()
                .unwrap()
                .push((attrs.metadata().name().to_string(), player));
        }
    }

    #[test]
    fn test_spans_carry_player() {
        let recorder = SpanRecorder::default();
        let subscriber = tracing_subscriber::registry()
            .with(PlayerContextLayer::new())
            .with(recorder.clone());

        tracing::subscriber::with_default(subscriber, || {
            let _anonymous = tracing::info_span!("boot").entered();
            let _guard = PlayerContextGuard::new(&UserId::from("neo"));
            let _scan = tracing::info_span!("scan").entered();
        });

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen[0], ("boot".to_string(), None));
        assert_eq!(seen[1], ("scan".to_string(), Some(UserId::from("neo"))));
    }

    #[test]
    fn test_child_span_inherits_player_across_threads() {
        let recorder = SpanRecorder::default();
        let subscriber = tracing_subscriber::registry()
            .with(PlayerContextLayer::new())
            .with(recorder.clone());
        let dispatch = tracing::Dispatch::new(subscriber);

        tracing::dispatcher::with_default(&dispatch, || {
            let parent = {
                let _guard = PlayerContextGuard::new(&UserId::from("trinity"));
                tracing::info_span!("connect")
            };

            let dispatch = dispatch.clone();
            std::thread::spawn(move || {
                tracing::dispatcher::with_default(&dispatch, || {
                    let _child = tracing::info_span!(parent: &parent, "download").entered();
                });
            })
            .join()
            .unwrap();
        });

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen[1], ("download".to_string(), Some(UserId::from("trinity"))));
    }
}
