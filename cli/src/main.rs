use clap::{Parser, Subcommand};
use kelasku::model::entity::{
    Lesson, LessonCreate, Module, ModuleCreate, Question, QuestionCreate, Quiz, QuizCreate,
    UserEntity, UserEntityCreateUpdate,
};
use kelasku::model::{CrudRepository, DatabaseError, DbConnection, ModelManager};
use kelasku::web::AuthenticatedUser;

#[derive(Parser, Debug)]
#[command(about = "CLI tool for filling the e-learning DB", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Manage modules
    Module {
        #[command(subcommand)]
        action: ModuleCommands,
    },

    /// Manage lessons
    Lesson {
        #[command(subcommand)]
        action: LessonCommands,
    },

    /// Manage quizzes
    Quiz {
        #[command(subcommand)]
        action: QuizCommands,
    },
}

/// User management
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "student")]
        role: String,
    },
}

/// Module management
#[derive(Subcommand, Debug)]
pub enum ModuleCommands {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value_t = 0)]
        order_index: i32,
    },
}

/// Lesson management
#[derive(Subcommand, Debug)]
pub enum LessonCommands {
    Add {
        /// Module title to attach the lesson to
        #[arg(long)]
        module_title: String,
        #[arg(long)]
        title: String,
        /// Path to a Markdown file with lesson content
        #[arg(long)]
        file: String,
        #[arg(long, default_value_t = 0)]
        order_index: i32,
    },
}

/// Quiz management
#[derive(Subcommand, Debug)]
pub enum QuizCommands {
    Add {
        /// Module title to attach the quiz to
        #[arg(long)]
        module_title: String,
        #[arg(long)]
        title: String,
        /// Optional time limit in seconds
        #[arg(long)]
        time_limit_sec: Option<i32>,
    },
    AddQuestion {
        /// Quiz title to attach the question to
        #[arg(long)]
        quiz_title: String,
        #[arg(long, default_value = "multiple_choice")]
        question_type: String,
        #[arg(long)]
        text: String,
        /// Answer options, comma separated
        #[arg(long, value_delimiter = ',')]
        options: Vec<String>,
        #[arg(long)]
        correct_index: Option<i32>,
        #[arg(long, default_value_t = 0)]
        order_index: i32,
    },
}

#[tokio::main]
async fn main() -> kelasku::error::AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let db_con = DbConnection::connect(&std::env::var("DATABASE_URL").unwrap())?;
    let mm = ModelManager::new(db_con);
    let actor = AuthenticatedUser::system();

    match args.command {
        Commands::User { action } => match action {
            UserCommands::Add {
                name,
                email,
                password,
                role,
            } => {
                let user = UserEntity::create(
                    &mm,
                    &actor,
                    UserEntityCreateUpdate {
                        name,
                        email,
                        password_hash: kelasku::auth::hash_password(&password).unwrap(),
                        role: Some(role),
                        status: None,
                    },
                )
                .await?;
                println!("User created: {:?}", user);
            }
        },

        Commands::Module { action } => match action {
            ModuleCommands::Add {
                title,
                description,
                order_index,
            } => {
                let module = Module::create(
                    &mm,
                    &actor,
                    ModuleCreate {
                        title,
                        description,
                        order_index: Some(order_index),
                        visible: None,
                    },
                )
                .await?;
                println!("Module created: {:?}", module);
            }
        },

        Commands::Lesson { action } => match action {
            LessonCommands::Add {
                module_title,
                title,
                file,
                order_index,
            } => {
                let module_id: uuid::Uuid =
                    sqlx::query_scalar("SELECT id FROM modules WHERE title = $1")
                        .bind(&module_title)
                        .fetch_one(mm.executor())
                        .await
                        .map_err(DatabaseError::SqlxError)?;

                let content = std::fs::read_to_string(file)?;
                let lesson = Lesson::create(
                    &mm,
                    &actor,
                    LessonCreate {
                        module_id,
                        title,
                        content,
                        attachment_url: None,
                        order_index: Some(order_index),
                        visible: None,
                    },
                )
                .await?;
                println!("Lesson created: {:?}", lesson);
            }
        },

        Commands::Quiz { action } => match action {
            QuizCommands::Add {
                module_title,
                title,
                time_limit_sec,
            } => {
                let module_id: uuid::Uuid =
                    sqlx::query_scalar("SELECT id FROM modules WHERE title = $1")
                        .bind(&module_title)
                        .fetch_one(mm.executor())
                        .await
                        .map_err(DatabaseError::SqlxError)?;

                let quiz = Quiz::create(
                    &mm,
                    &actor,
                    QuizCreate {
                        module_id: Some(module_id),
                        lesson_id: None,
                        title,
                        time_limit_sec,
                    },
                )
                .await?;
                println!("Quiz created: {:?}", quiz);
            }

            QuizCommands::AddQuestion {
                quiz_title,
                question_type,
                text,
                options,
                correct_index,
                order_index,
            } => {
                let quiz_id: uuid::Uuid =
                    sqlx::query_scalar("SELECT id FROM quizzes WHERE title = $1")
                        .bind(&quiz_title)
                        .fetch_one(mm.executor())
                        .await
                        .map_err(DatabaseError::SqlxError)?;

                let question = Question::create(
                    &mm,
                    &actor,
                    QuestionCreate {
                        quiz_id,
                        question_type,
                        text,
                        options: Some(options),
                        correct_index,
                        correct_indexes: None,
                        image_url: None,
                        order_index: Some(order_index),
                    },
                )
                .await?;
                println!("Question created: {:?}", question);
            }
        },
    }

    Ok(())
}
