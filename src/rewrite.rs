//! Streaming HTML localization.
//!
//! [`PageLocalizer`] drives a `lol_html` rewriter with three rules:
//!
//! - `html`: set `lang` to the negotiated locale
//! - `head`: append a `<meta name="description">` holding the subtitle
//! - `[data-i18n-key]`: replace the element's content with the catalog text
//!
//! The rules touch disjoint parts of the document, so their order does not
//! change the output. Running a page through twice appends a second meta
//! description; callers apply the localizer once per response.

use crate::assets::AssetBody;
use crate::error::{Failure, ServeError, Unhandled};
use crate::i18n::{Language, LanguageStrings};
use axum::body::Bytes;
use futures::stream::{self, StreamExt};
use lol_html::html_content::ContentType;
use lol_html::{element, HtmlRewriter, Settings};
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Attribute naming the catalog field an element should display
pub const TRANSLATION_KEY_ATTRIBUTE: &str = "data-i18n-key";

const TRANSLATION_KEY_SELECTOR: &str = "[data-i18n-key]";

/// Chunks buffered between the network side and the rewriter thread
const CHANNEL_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct PageLocalizer {
    language: Language,
    strings: &'static LanguageStrings,
}

impl PageLocalizer {
    pub fn new(language: Language, strings: &'static LanguageStrings) -> Self {
        Self { language, strings }
    }

    /// Localizer for a language using its own catalog entry.
    pub fn for_language(language: Language) -> Self {
        Self::new(language, LanguageStrings::for_language(language))
    }

    /// Rewrite `input` chunk by chunk, handing rewritten bytes to `output`
    /// as soon as the rewriter releases them.
    ///
    /// The first `Err` chunk from `input` stops the rewrite and is returned.
    pub fn rewrite<I, O>(&self, input: I, mut output: O) -> Result<(), ServeError>
    where
        I: IntoIterator<Item = Result<Bytes, ServeError>>,
        O: FnMut(&[u8]),
    {
        let code = self.language.code();
        let strings = self.strings;
        let description = description_meta(strings.subtitle);

        let mut rewriter = HtmlRewriter::new(
            Settings {
                element_content_handlers: vec![
                    element!("html", move |el| {
                        el.set_attribute("lang", code)?;
                        Ok(())
                    }),
                    element!("head", move |el| {
                        el.append(&description, ContentType::Html);
                        Ok(())
                    }),
                    element!(TRANSLATION_KEY_SELECTOR, move |el| {
                        let translation = el
                            .get_attribute(TRANSLATION_KEY_ATTRIBUTE)
                            .and_then(|key| strings.translation(&key));
                        if let Some(text) = translation {
                            el.set_inner_content(text, ContentType::Text);
                        }
                        Ok(())
                    }),
                ],
                ..Settings::new()
            },
            |chunk: &[u8]| {
                if !chunk.is_empty() {
                    output(chunk);
                }
            },
        );

        for chunk in input {
            rewriter.write(&chunk?)?;
        }
        rewriter.end()?;

        Ok(())
    }

    /// Rewrite a complete document held in memory.
    pub fn rewrite_str(&self, html: &str) -> Result<String, ServeError> {
        let mut out = Vec::with_capacity(html.len());
        self.rewrite(
            std::iter::once(Ok(Bytes::copy_from_slice(html.as_bytes()))),
            |chunk| out.extend_from_slice(chunk),
        )?;
        String::from_utf8(out).map_err(|e| ServeError::Rewrite(e.to_string()))
    }

    /// Localize a streamed body.
    ///
    /// The rewriter is not `Send`, so it runs on a blocking thread between two
    /// bounded channels. This waits for the first rewritten chunk: a failure
    /// before any output exists is returned here, a failure after that ends
    /// the returned stream with an `Err` item. Dropping the returned stream
    /// stops the rewriter and the upstream body.
    pub async fn localize(self, body: AssetBody) -> Result<AssetBody, Failure> {
        stream_through(body, move |input, output| self.rewrite(input, output)).await
    }
}

/// Run a blocking, chunk-at-a-time rewrite over a streamed body.
///
/// A panic in `rewrite` before any output is reported as
/// [`Failure::Unhandled`]; after output has been handed out it becomes the
/// last `Err` item of the stream.
async fn stream_through<F>(body: AssetBody, rewrite: F) -> Result<AssetBody, Failure>
where
    F: FnOnce(
            &mut dyn Iterator<Item = Result<Bytes, ServeError>>,
            &mut dyn FnMut(&[u8]),
        ) -> Result<(), ServeError>
        + Send
        + 'static,
{
    let (input_tx, mut input_rx) = mpsc::channel::<Result<Bytes, ServeError>>(CHANNEL_DEPTH);
    let (output_tx, mut output_rx) = mpsc::channel::<Result<Bytes, ServeError>>(CHANNEL_DEPTH);

    tokio::spawn(async move {
        let mut body = body;
        while let Some(chunk) = body.next().await {
            let failed = chunk.is_err();
            if input_tx.send(chunk).await.is_err() || failed {
                break;
            }
        }
    });

    let rewriter = tokio::task::spawn_blocking(move || {
        let closed = Cell::new(false);
        let started = Cell::new(false);
        let mut input = std::iter::from_fn(|| {
            if closed.get() {
                None
            } else {
                input_rx.blocking_recv()
            }
        });
        let mut output = |chunk: &[u8]| {
            if output_tx
                .blocking_send(Ok(Bytes::copy_from_slice(chunk)))
                .is_err()
            {
                closed.set(true);
            } else {
                started.set(true);
            }
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| rewrite(&mut input, &mut output)));

        match result {
            Ok(Ok(())) if closed.get() => debug!("Client went away during rewrite"),
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = output_tx.blocking_send(Err(e));
            }
            // Nothing sent yet: the join handle carries the payload
            Err(payload) if !started.get() => panic::resume_unwind(payload),
            Err(payload) => {
                let unhandled = Unhandled::new(payload);
                let message = format!(
                    "rewriter panicked: {}",
                    unhandled.message().unwrap_or("<non-string payload>")
                );
                let _ = output_tx.blocking_send(Err(ServeError::Rewrite(message)));
            }
        }
    });

    let first = match output_rx.recv().await {
        Some(Err(e)) => return Err(e.into()),
        Some(Ok(chunk)) => Some(chunk),
        // Rewriter finished without output: empty document or a panic
        None => match rewriter.await {
            Ok(()) => None,
            Err(join_error) => {
                return Err(match join_error.try_into_panic() {
                    Ok(payload) => Unhandled::new(payload).into(),
                    Err(join_error) => ServeError::Rewrite(join_error.to_string()).into(),
                });
            }
        },
    };

    let rest = stream::unfold(output_rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    })
    .inspect(|item| {
        if let Err(e) = item {
            error!("Localized body failed after streaming started: {}", e);
        }
    });

    Ok(stream::iter(first.map(Ok)).chain(rest).boxed())
}

/// `<meta name="description">` tag for a subtitle, attribute-escaped.
fn description_meta(subtitle: &str) -> String {
    format!(
        r#"<meta name="description" content="{}" />"#,
        escape_attribute(subtitle)
    )
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
