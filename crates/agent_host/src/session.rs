//! One conversation over a set of loaded datasets.
//!
//! Questions go to an external [`DataAgent`]; its reply is classified into
//! renderable responses. When the agent gives up on a question that asks for
//! a general overview, the automatic insight report answers it instead.

use insights::AutoInsight;
use shared::{AgentError, AgentReply, Dataset, RenderableResponse};

use crate::classifier::classify;

/// Natural-language data agent reached over some transport.
///
/// Returns exactly one value per question, or its own failure.
pub trait DataAgent {
    fn chat(&mut self, question: &str) -> AgentReply;
}

const NO_DATA: &str = "No data loaded. Please upload data files first.";

/// Text the agent emits when it could not produce an answer
const FAILURE_PHRASES: &[&str] = &[
    "Unfortunately, I was not able to get your answer",
    "No code found in the response",
    "No result returned",
];

const INSIGHT_KEYWORDS: &[&str] = &[
    "insight",
    "summary",
    "summarize",
    "overview",
    "describe",
    "tell me about",
    "analyze",
    "analysis",
    "what can you tell",
    "explore",
    "分析",
    "洞察",
    "概述",
    "总结",
    "概览",
    "描述",
];

const QUERY_HINT: &str = "I couldn't complete the analysis for that question. \
Try asking more specific questions like:\n\
- What is the average of [column]?\n\
- Show me the top 10 rows by [column]\n\
- Plot a histogram of [column]\n\
- What are the unique values in [column]?";

pub struct QuerySession<A: DataAgent> {
    agent: A,
    datasets: Vec<(String, Dataset)>,
    insight: AutoInsight,
}

impl<A: DataAgent> QuerySession<A> {
    pub fn new(agent: A, insight: AutoInsight) -> Self {
        Self {
            agent,
            datasets: Vec::new(),
            insight,
        }
    }

    pub fn with_datasets(mut self, datasets: Vec<(String, Dataset)>) -> Self {
        self.datasets = datasets;
        self
    }

    pub fn add_dataset(&mut self, name: impl Into<String>, dataset: Dataset) {
        self.datasets.push((name.into(), dataset));
    }

    pub fn datasets(&self) -> &[(String, Dataset)] {
        &self.datasets
    }

    pub fn has_data(&self) -> bool {
        !self.datasets.is_empty()
    }

    /// Automatic report over every loaded dataset
    pub fn generate_insights(&self) -> Vec<RenderableResponse> {
        if !self.has_data() {
            return vec![RenderableResponse::Error(NO_DATA.to_string())];
        }
        self.insight.generate_report(&self.datasets).into_entries()
    }

    /// Answer one question
    pub fn ask(&mut self, question: &str) -> Vec<RenderableResponse> {
        if !self.has_data() {
            return vec![RenderableResponse::Error(NO_DATA.to_string())];
        }

        tracing::info!("Asking agent: {}", question);
        match self.agent.chat(question) {
            Err(e @ (AgentError::NoCodeFound(_) | AgentError::NoResult(_))) => {
                tracing::warn!("Agent could not answer: {}", e);
                self.fallback(question)
            }
            Err(e) => {
                tracing::warn!("Agent query failed: {}", e);
                vec![RenderableResponse::Error(format!("Query failed: {}", e))]
            }
            Ok(output) => {
                let response = classify(Ok(output));
                match response.as_text() {
                    Some(text) if is_agent_failure(text) => {
                        tracing::warn!("Agent reported failure: {}", text);
                        self.fallback(question)
                    }
                    _ => vec![response],
                }
            }
        }
    }

    fn fallback(&self, question: &str) -> Vec<RenderableResponse> {
        if is_insight_question(question) {
            tracing::info!("Falling back to automatic insights");
            self.generate_insights()
        } else {
            vec![RenderableResponse::Text(QUERY_HINT.to_string())]
        }
    }
}

pub fn is_agent_failure(text: &str) -> bool {
    FAILURE_PHRASES.iter().any(|p| text.contains(p))
}

/// Whether the question asks for a general look at the data
pub fn is_insight_question(question: &str) -> bool {
    let lower = question.to_lowercase();
    INSIGHT_KEYWORDS.iter().any(|k| lower.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Column, ResponseKind, Value};
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Replay {
        replies: VecDeque<AgentReply>,
        questions: Vec<String>,
    }

    impl Replay {
        fn with(reply: AgentReply) -> Self {
            Self {
                replies: VecDeque::from(vec![reply]),
                questions: Vec::new(),
            }
        }
    }

    impl DataAgent for Replay {
        fn chat(&mut self, question: &str) -> AgentReply {
            self.questions.push(question.to_string());
            self.replies
                .pop_front()
                .unwrap_or_else(|| Err(AgentError::NoResult("empty".into())))
        }
    }

    fn dataset() -> Dataset {
        Dataset::new(vec![
            Column::inferred("n", vec![Value::Int(1), Value::Int(4), Value::Int(2)]),
            Column::inferred("k", vec!["a".into(), "b".into(), "a".into()]),
        ])
    }

    fn session(reply: AgentReply) -> QuerySession<Replay> {
        QuerySession::new(Replay::with(reply), AutoInsight::default())
            .with_datasets(vec![("data.csv".into(), dataset())])
    }

    #[test]
    fn test_no_data() {
        let mut session = QuerySession::new(Replay::default(), AutoInsight::default());
        let responses = session.ask("how many rows?");
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].as_error(), Some(NO_DATA));
        assert!(session.agent.questions.is_empty());
    }

    #[test]
    fn test_plain_answer_is_classified() {
        let mut session = session(Ok(Box::new(3i64)));
        let responses = session.ask("how many rows?");
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].as_text(), Some("3"));
    }

    #[test]
    fn test_failure_phrase_on_overview_question_falls_back_to_report() {
        let reply: AgentReply = Ok(Box::new(
            "Unfortunately, I was not able to get your answer, because of the following error"
                .to_string(),
        ));
        let mut session = session(reply);
        let responses = session.ask("Give me an overview of this data");

        assert_eq!(responses[0].kind(), ResponseKind::Text);
        assert!(responses[0].as_text().unwrap().starts_with("## data.csv"));
        assert!(responses.iter().any(|r| r.kind() == ResponseKind::Chart));
    }

    #[test]
    fn test_no_code_on_specific_question_gives_hint() {
        let mut session = session(Err(AgentError::NoCodeFound("parse".into())));
        let responses = session.ask("average of n by k");
        assert_eq!(responses.len(), 1);
        assert!(responses[0]
            .as_text()
            .unwrap()
            .contains("Plot a histogram of [column]"));
    }

    #[test]
    fn test_other_agent_errors_are_reported() {
        let mut session = session(Err(AgentError::Failed("connection refused".into())));
        let responses = session.ask("summarize");
        assert_eq!(
            responses[0].as_error(),
            Some("Query failed: connection refused")
        );
    }

    #[test]
    fn test_insight_keywords() {
        assert!(is_insight_question("Please SUMMARIZE the sales"));
        assert!(is_insight_question("帮我分析一下数据"));
        assert!(!is_insight_question("what is the max price?"));
    }
}
