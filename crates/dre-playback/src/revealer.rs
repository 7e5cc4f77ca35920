//! Text revealer
//!
//! Produces the "typing" effect: a time-paced sequence of growing prefixes
//! of a target string, one per character, ending at the full string.
//!
//! Prefixes are cut on `char` boundaries, so multi-byte text (`→`, `×`) is
//! never split mid code point.

use futures::Stream;
use std::str::CharIndices;
use std::time::Duration;

/// Lazy iterator over the non-empty prefixes of a string
#[derive(Debug, Clone)]
pub struct Prefixes<'a> {
    text: &'a str,
    chars: CharIndices<'a>,
}

impl<'a> Iterator for Prefixes<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let (start, ch) = self.chars.next()?;
        Some(&self.text[..start + ch.len_utf8()])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chars.size_hint()
    }
}

/// Prefixes of `text` of length 1..=n, in order
///
/// Empty input yields nothing.
#[inline]
#[must_use]
pub fn prefixes(text: &str) -> Prefixes<'_> {
    Prefixes {
        text,
        chars: text.char_indices(),
    }
}

/// Suspend for `delay`, skipping the timer entirely when it is zero
pub(crate) async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Time-paced prefix reveal of one string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRevealer {
    text: String,
    char_delay: Duration,
}

impl TextRevealer {
    /// Create a revealer for `text` with `char_delay` between updates
    #[inline]
    #[must_use]
    pub fn new(text: impl Into<String>, char_delay: Duration) -> Self {
        Self {
            text: text.into(),
            char_delay,
        }
    }

    /// Target string
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Delay after each revealed character
    #[inline]
    #[must_use]
    pub fn char_delay(&self) -> Duration {
        self.char_delay
    }

    /// Number of updates a full reveal produces
    #[inline]
    #[must_use]
    pub fn update_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Wall time of a full reveal, saturating at [`Duration::MAX`]
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.char_delay
            .saturating_mul(u32::try_from(self.update_count()).unwrap_or(u32::MAX))
    }

    /// Stream of prefixes, suspending `char_delay` after each
    ///
    /// Every call starts a fresh reveal. Dropping the stream stops it: no
    /// prefix is produced after the drop.
    pub fn reveal(&self) -> impl Stream<Item = String> + Send + 'static {
        let text = self.text.clone();
        let delay = self.char_delay;
        async_stream::stream! {
            for prefix in prefixes(&text) {
                yield prefix.to_string();
                pause(delay).await;
            }
        }
    }

    /// Callback form of [`TextRevealer::reveal`]
    ///
    /// Invokes `on_update` once per character with the accumulated prefix.
    pub async fn reveal_into<F>(&self, mut on_update: F)
    where
        F: FnMut(&str),
    {
        for prefix in prefixes(&self.text) {
            on_update(prefix);
            pause(self.char_delay).await;
        }
    }
}
