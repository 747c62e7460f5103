mod user;
pub use user::{UserEntity, UserEntityCreateUpdate};

mod module;
pub use module::{Module, ModuleCreate, ModuleProgressRow, ModuleWithLessonsRow};

mod lesson;
pub use lesson::{Lesson, LessonCreate, LessonWithStatusRow};

mod quiz;
pub use quiz::{Quiz, QuizCreate, QuizWithStateRow};

mod question;
pub use question::{GradedSelection, Question, QuestionCreate, SubmittedAnswer};

mod answer;
pub use answer::{Answer, AnswerCreate, CompletionRow, QuizScoreRow};

mod retake_grant;
pub use retake_grant::{RetakeGrant, RetakeGrantCreate};

mod lesson_read;
pub use lesson_read::{LessonRead, LessonReadCreate};
