//! Insight composition.
//!
//! A NORMAL verdict always yields [`STABLE_MESSAGE`] without touching the
//! generator. Any other verdict gets a prompt in the configured
//! [`PromptStyle`], one bounded generator call, and a deterministic fallback
//! whenever that call produces nothing usable. The composer never returns an
//! empty string.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::generator::{GenerateError, TextGenerator};
use crate::process::AggregatedConsumer;
use crate::snapshot::SystemSnapshot;
use crate::units::display_number;
use crate::verdict::Verdict;

/// Insight returned for a NORMAL verdict.
pub const STABLE_MESSAGE: &str = "System stable. No action needed.";

/// Shape of the prompt sent to the generator, and of the matching fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptStyle {
    /// Exactly three numbered lines naming the top process.
    #[default]
    Numbered,
    /// One short line under a verdict-dependent character limit.
    Brief,
}

impl PromptStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numbered => "numbered",
            Self::Brief => "brief",
        }
    }
}

impl fmt::Display for PromptStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown prompt style name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown prompt style '{0}' (expected numbered or brief)")]
pub struct ParseStyleError(pub String);

impl FromStr for PromptStyle {
    type Err = ParseStyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "numbered" | "steps" => Ok(Self::Numbered),
            "brief" | "short" => Ok(Self::Brief),
            _ => Err(ParseStyleError(s.to_string())),
        }
    }
}

/// Character budget and tone for the brief style. NORMAL never reaches the
/// generator, so only the two pressure verdicts have their own budget.
fn brief_limits(verdict: Verdict) -> (usize, &'static str) {
    if verdict == Verdict::Overloaded {
        (40, "cautionary but not alarming")
    } else {
        (30, "informative and neutral")
    }
}

/// Build the generator prompt for a non-stable verdict.
pub fn build_prompt(
    style: PromptStyle,
    verdict: Verdict,
    snapshot: &SystemSnapshot,
    top: &AggregatedConsumer,
) -> String {
    let memory = display_number(snapshot.memory.percent);
    let top_mem = display_number(top.memory_gb);
    match style {
        PromptStyle::Numbered => format!(
            "CRITICAL INSTRUCTION: You must output EXACTLY 3 numbered lines. Nothing else.\n\
             \n\
             System status: {verdict}\n\
             Problem: {name} using {top_mem}GB ({memory}% memory total)\n\
             \n\
             Your output must be EXACTLY this format:\n\
             1. [process name] is using high memory.\n\
             2. Close [process name] if not in use or restart.\n\
             3. Refresh status again to check.\n\
             \n\
             Output the 3 numbered lines now using the process: {name}\n",
            name = top.name,
        ),
        PromptStyle::Brief => {
            let (limit, tone) = brief_limits(verdict);
            let cpu = display_number(snapshot.cpu_percent);
            let swap = display_number(snapshot.swap.percent);
            format!(
                "You are a system monitor.\n\
                 \n\
                 Write a short structured insight.\n\
                 Use 1 or 2 short lines or bullets.\n\
                 Total characters MUST be under {limit}.\n\
                 No punctuation at end.\n\
                 No emojis.\n\
                 No explanations.\n\
                 \n\
                 Tone: {tone}\n\
                 \n\
                 Context:\n\
                 CPU {cpu} percent\n\
                 Memory {memory} percent\n\
                 Swap {swap} percent\n\
                 Top process {name} using {top_mem}GB\n\
                 State {verdict}\n\
                 \n\
                 Return only the insight.\n",
                name = top.name,
            )
        }
    }
}

/// Deterministic insight built only from local readings.
pub fn fallback_text(
    style: PromptStyle,
    verdict: Verdict,
    snapshot: &SystemSnapshot,
    top: &AggregatedConsumer,
) -> String {
    let memory = display_number(snapshot.memory.percent);
    let top_mem = display_number(top.memory_gb);
    let name = &top.name;
    match style {
        PromptStyle::Numbered => format!(
            "1. {name} is using high memory ({top_mem}GB, {memory}% memory total).\n\
             2. Close {name} if not in use or restart.\n\
             3. Refresh status again to check."
        ),
        PromptStyle::Brief => {
            format!("{verdict}: memory at {memory}%. Consider closing {name} ({top_mem}GB).")
        }
    }
}

/// Where an insight's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightSource {
    /// Fixed stable message; no generator involved.
    Stable,
    /// Text produced by the generator.
    Generated,
    /// Local template after the generator failed or was not configured.
    Fallback,
}

/// Composed insight text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub text: String,
    pub source: InsightSource,
}

impl Insight {
    fn stable() -> Self {
        Self {
            text: STABLE_MESSAGE.to_string(),
            source: InsightSource::Stable,
        }
    }
}

/// Turns a verdict and readings into insight text.
#[derive(Clone)]
pub struct InsightComposer {
    generator: Option<Arc<dyn TextGenerator>>,
    style: PromptStyle,
    timeout: Duration,
}

impl InsightComposer {
    pub fn new(
        generator: Option<Arc<dyn TextGenerator>>,
        style: PromptStyle,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            style,
            timeout,
        }
    }

    /// Composer that never calls out; non-stable verdicts get the fallback.
    pub fn offline(style: PromptStyle) -> Self {
        Self::new(None, style, Duration::from_secs(6))
    }

    pub fn style(&self) -> PromptStyle {
        self.style
    }

    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Compose the insight for one report.
    pub async fn compose(
        &self,
        verdict: Verdict,
        snapshot: &SystemSnapshot,
        top: &AggregatedConsumer,
    ) -> Insight {
        if verdict.is_stable() {
            return Insight::stable();
        }

        let fallback = || Insight {
            text: fallback_text(self.style, verdict, snapshot, top),
            source: InsightSource::Fallback,
        };

        let Some(generator) = &self.generator else {
            debug!("[insight] no generator configured, using fallback");
            return fallback();
        };

        let prompt = build_prompt(self.style, verdict, snapshot, top);
        let result = match tokio::time::timeout(self.timeout, generator.generate(&prompt)).await {
            Ok(result) => result,
            Err(_) => Err(GenerateError::Timeout(self.timeout)),
        };

        match result {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    warn!(
                        "[insight] {} failed: {}; using fallback",
                        generator.name(),
                        GenerateError::EmptyResponse
                    );
                    fallback()
                } else {
                    Insight {
                        text: text.to_string(),
                        source: InsightSource::Generated,
                    }
                }
            }
            Err(err) => {
                warn!("[insight] {} failed: {err}; using fallback", generator.name());
                fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // -----------------------------------------------------------------------
    // Mock generators
    // -----------------------------------------------------------------------

    /// Returns a fixed result and counts calls.
    struct FixedGenerator {
        result: Result<String, GenerateError>,
        calls: AtomicUsize,
    }

    impl FixedGenerator {
        fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self {
                result: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn err(err: GenerateError) -> Arc<Self> {
            Arc::new(Self {
                result: Err(err),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    /// Never answers within any reasonable deadline.
    struct StallingGenerator;

    #[async_trait]
    impl TextGenerator for StallingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String, GenerateError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".to_string())
        }

        fn name(&self) -> &str {
            "stalling"
        }
    }

    fn overloaded_snapshot() -> SystemSnapshot {
        SystemSnapshot::with_percents(40.0, 91.2, 10.0)
    }

    fn chrome() -> AggregatedConsumer {
        AggregatedConsumer {
            name: "chrome".to_string(),
            memory_gb: 6.0,
            cpu_percent: None,
        }
    }

    fn composer(generator: Arc<dyn TextGenerator>) -> InsightComposer {
        InsightComposer::new(Some(generator), PromptStyle::Numbered, Duration::from_secs(6))
    }

    // -----------------------------------------------------------------------
    // Stable path
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_normal_returns_stable_message_without_calls() {
        let generator = FixedGenerator::ok("should not be used");
        let c = composer(generator.clone());
        for mem in [0.0, 35.0, 69.9] {
            let snap = SystemSnapshot::with_percents(99.0, mem, 99.0);
            let insight = c.compose(Verdict::Normal, &snap, &chrome()).await;
            assert_eq!(insight.text, STABLE_MESSAGE);
            assert_eq!(insight.source, InsightSource::Stable);
        }
        assert_eq!(generator.calls(), 0);
    }

    // -----------------------------------------------------------------------
    // Generated path
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_generated_text_is_trimmed_verbatim() {
        let generator = FixedGenerator::ok("\n  1. chrome is using high memory.\n2. x\n3. y  \n");
        let c = composer(generator.clone());
        let insight = c
            .compose(Verdict::Strained, &overloaded_snapshot(), &chrome())
            .await;
        assert_eq!(insight.text, "1. chrome is using high memory.\n2. x\n3. y");
        assert_eq!(insight.source, InsightSource::Generated);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_format_not_revalidated() {
        let generator = FixedGenerator::ok("just one line, not three");
        let c = composer(generator);
        let insight = c
            .compose(Verdict::Overloaded, &overloaded_snapshot(), &chrome())
            .await;
        assert_eq!(insight.text, "just one line, not three");
    }

    // -----------------------------------------------------------------------
    // Fallback path
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_transport_error_falls_back() {
        let generator = FixedGenerator::err(GenerateError::Transport("refused".into()));
        let c = composer(generator.clone());
        let insight = c
            .compose(Verdict::Overloaded, &overloaded_snapshot(), &chrome())
            .await;
        assert_eq!(insight.source, InsightSource::Fallback);
        assert!(insight.text.contains("chrome"));
        assert!(insight.text.contains("6.0GB"));
        assert!(insight.text.contains("91.2%"));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_response_falls_back() {
        let generator = FixedGenerator::err(GenerateError::EmptyResponse);
        let insight = composer(generator)
            .compose(Verdict::Strained, &overloaded_snapshot(), &chrome())
            .await;
        assert_eq!(insight.source, InsightSource::Fallback);
        assert!(!insight.text.trim().is_empty());
    }

    #[tokio::test]
    async fn test_whitespace_only_success_falls_back() {
        let generator = FixedGenerator::ok("   \n\t ");
        let insight = composer(generator)
            .compose(Verdict::Overloaded, &overloaded_snapshot(), &chrome())
            .await;
        assert_eq!(insight.source, InsightSource::Fallback);
        assert!(insight.text.contains("chrome"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let c = InsightComposer::new(
            Some(Arc::new(StallingGenerator)),
            PromptStyle::Numbered,
            Duration::from_secs(6),
        );
        let insight = c
            .compose(Verdict::Overloaded, &overloaded_snapshot(), &chrome())
            .await;
        assert_eq!(insight.source, InsightSource::Fallback);
        assert!(insight.text.contains("chrome"));
        assert!(insight.text.contains("91.2"));
    }

    #[tokio::test]
    async fn test_no_generator_falls_back() {
        let c = InsightComposer::offline(PromptStyle::Brief);
        assert!(!c.has_generator());
        let insight = c
            .compose(Verdict::Overloaded, &overloaded_snapshot(), &chrome())
            .await;
        assert_eq!(
            insight.text,
            "OVERLOADED: memory at 91.2%. Consider closing chrome (6.0GB)."
        );
    }

    #[test]
    fn test_numbered_fallback_has_three_lines() {
        let text = fallback_text(
            PromptStyle::Numbered,
            Verdict::Overloaded,
            &overloaded_snapshot(),
            &chrome(),
        );
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("1. chrome"));
        assert!(lines[1].starts_with("2. Close chrome"));
        assert!(lines[2].starts_with("3. "));
    }

    #[test]
    fn test_fallback_with_unknown_sentinel() {
        let text = fallback_text(
            PromptStyle::Numbered,
            Verdict::Strained,
            &overloaded_snapshot(),
            &AggregatedConsumer::unknown(),
        );
        assert!(text.contains("unknown"));
        assert!(text.contains("0.0GB"));
    }

    // -----------------------------------------------------------------------
    // Prompts
    // -----------------------------------------------------------------------

    #[test]
    fn test_numbered_prompt_mentions_readings() {
        let prompt = build_prompt(
            PromptStyle::Numbered,
            Verdict::Overloaded,
            &overloaded_snapshot(),
            &chrome(),
        );
        assert!(prompt.contains("EXACTLY 3 numbered lines"));
        assert!(prompt.contains("System status: OVERLOADED"));
        assert!(prompt.contains("chrome using 6.0GB (91.2% memory total)"));
        assert!(prompt.ends_with("using the process: chrome\n"));
    }

    #[test]
    fn test_brief_prompt_limit_depends_on_verdict() {
        let snap = overloaded_snapshot();
        let strained = build_prompt(PromptStyle::Brief, Verdict::Strained, &snap, &chrome());
        let overloaded = build_prompt(PromptStyle::Brief, Verdict::Overloaded, &snap, &chrome());
        assert!(strained.contains("under 30"));
        assert!(strained.contains("informative and neutral"));
        assert!(overloaded.contains("under 40"));
        assert!(overloaded.contains("cautionary but not alarming"));
        assert!(overloaded.contains("CPU 40.0 percent"));
        assert!(overloaded.contains("Memory 91.2 percent"));
    }

    #[test]
    fn test_brief_prompt_has_no_stable_budget() {
        let snap = overloaded_snapshot();
        for verdict in [Verdict::Normal, Verdict::Strained, Verdict::Overloaded] {
            let prompt = build_prompt(PromptStyle::Brief, verdict, &snap, &chrome());
            assert!(!prompt.contains("under 20"));
            assert!(!prompt.contains("calm"));
        }
    }

    #[test]
    fn test_parse_style() {
        assert_eq!("numbered".parse::<PromptStyle>(), Ok(PromptStyle::Numbered));
        assert_eq!("BRIEF".parse::<PromptStyle>(), Ok(PromptStyle::Brief));
        assert!("haiku".parse::<PromptStyle>().is_err());
    }
}
