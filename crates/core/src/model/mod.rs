mod ids;
mod lesson;
mod question;
mod result;
mod session;
mod settings;
mod vocabulary;

pub use ids::{LessonId, ParseIdError, QuestionId};
pub use lesson::{Lesson, LessonError, LessonProgress};
pub use question::{Direction, MATCHING_ARITY, MatchSide, MatchingSet, Question, QuestionKind};
pub use result::{IncorrectAnswer, TestResult, compute_score};
pub use session::SessionSnapshot;
pub use settings::{QuizSettings, SettingsError};
pub use vocabulary::{VocabularyPair, VocabularySet};
