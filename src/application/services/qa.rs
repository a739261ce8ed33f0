use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::application::RagService;
use crate::domain::{ports::LlmService, Answer, AnswerSource, DomainError, SearchResult};

pub const NO_ANSWER: &str = "Answer not available in the context.";

pub const DEFAULT_QA_TEMPLATE: &str = "
Answer the question as detailed as possible from the provided context. If the answer is not in the context, reply \"Answer not available in the context.\".

Context:
{context}

Question:
{question}

Answer:
";

const CONTEXT_VAR: &str = "{context}";
const QUESTION_VAR: &str = "{question}";

/// A prompt with `{context}` and `{question}` placeholders.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self, DomainError> {
        let template = template.into();
        for var in [CONTEXT_VAR, QUESTION_VAR] {
            if !template.contains(var) {
                return Err(DomainError::validation(format!(
                    "prompt template is missing {var}"
                )));
            }
        }
        Ok(Self { template })
    }

    /// Substitutes both placeholders in one pass over the template, so values
    /// that themselves contain a placeholder are inserted verbatim.
    pub fn render(&self, context: &str, question: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + context.len() + question.len());
        let mut rest = self.template.as_str();

        loop {
            let next = [(CONTEXT_VAR, context), (QUESTION_VAR, question)]
                .into_iter()
                .filter_map(|(var, value)| rest.find(var).map(|pos| (pos, var, value)))
                .min_by_key(|(pos, _, _)| *pos);

            match next {
                Some((pos, var, value)) => {
                    out.push_str(&rest[..pos]);
                    out.push_str(value);
                    rest = &rest[pos + var.len()..];
                }
                None => {
                    out.push_str(rest);
                    break;
                }
            }
        }

        out
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_QA_TEMPLATE.to_string(),
        }
    }
}

/// Answers questions by stuffing every retrieved chunk into a single prompt.
pub struct QaService {
    rag: Arc<RagService>,
    llm: Arc<dyn LlmService>,
    template: PromptTemplate,
    system_prompt: Option<String>,
    top_k: usize,
    timeout: Duration,
}

impl QaService {
    pub fn new(rag: Arc<RagService>, llm: Arc<dyn LlmService>) -> Self {
        let top_k = rag.default_top_k();
        Self {
            rag,
            llm,
            template: PromptTemplate::default(),
            system_prompt: None,
            top_k,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.system_prompt = (!prompt.trim().is_empty()).then_some(prompt);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[instrument(skip(self), fields(model = self.llm.model(), top_k = self.top_k))]
    pub async fn answer(&self, question: &str) -> Result<Answer, DomainError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(DomainError::validation("question must not be empty"));
        }

        let results = self.rag.ready_retrieve(question, self.top_k).await?;
        tracing::debug!(retrieved = results.len(), "context retrieved");

        let prompt = self.template.render(&stuff_context(&results), question);

        let completion = async {
            match &self.system_prompt {
                Some(system) => self.llm.complete_with_system(system, &prompt).await,
                None => self.llm.complete(&prompt).await,
            }
        };
        let answer = tokio::time::timeout(self.timeout, completion)
            .await
            .map_err(|_| DomainError::timeout("answer generation timed out"))??;

        Ok(Answer {
            question: question.to_string(),
            answer: answer.trim().to_string(),
            sources: results.iter().map(AnswerSource::from).collect(),
        })
    }
}

fn stuff_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| r.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
