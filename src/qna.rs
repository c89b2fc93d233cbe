use crate::{Error, Result};

/// A help center question and the subpage its answer lives on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionLinkPair {
    pub question: String,
    pub url: String,
}

impl QuestionLinkPair {
    pub fn new(question: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            url: url.into(),
        }
    }

    /// Consumes the link, keeping the question and attaching its fetched answer.
    pub fn answered(self, answer: String) -> QuestionAnswerPair {
        QuestionAnswerPair {
            question: self.question,
            answer,
        }
    }
}

/// A question with its answer rendered as markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionAnswerPair {
    pub question: String,
    pub answer: String,
}

impl QuestionAnswerPair {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Alternating question, answer, question, answer, ... values.
///
/// Always holds an even number of values; an odd count means a worksheet has an
/// unanswered question or an orphaned answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatQaList(Vec<String>);

impl FlatQaList {
    pub fn try_from_values(values: Vec<String>) -> Result<Self> {
        if values.len() % 2 != 0 {
            return Err(Error::Integrity {
                count: values.len(),
            });
        }
        Ok(Self(values))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn values(&self) -> &[String] {
        &self.0
    }

    /// Iterates `(question, answer)`.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .chunks_exact(2)
            .map(|pair| (pair[0].as_str(), pair[1].as_str()))
    }
}

#[cfg(test)]
impl From<&[QuestionAnswerPair]> for FlatQaList {
    fn from(pairs: &[QuestionAnswerPair]) -> Self {
        Self(
            pairs
                .iter()
                .flat_map(|p| [p.question.clone(), p.answer.clone()])
                .collect(),
        )
    }
}
