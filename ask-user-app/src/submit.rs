//! Submission gate.

use crate::question::Question;
use crate::selection::AnswerStore;

/// Required questions that still lack a valid answer, in question order.
pub fn missing_required<'a>(questions: &'a [Question], store: &AnswerStore) -> Vec<&'a Question> {
    questions
        .iter()
        .filter(|q| q.required && !store.is_answered(q.id()))
        .collect()
}

pub fn can_submit(questions: &[Question], store: &AnswerStore) -> bool {
    missing_required(questions, store).is_empty()
}
