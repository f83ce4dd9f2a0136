pub mod config;
pub mod db;
pub mod error;
pub mod flush;
pub mod id;
pub mod identity;
pub mod leadership;
pub mod model;
pub mod planner;
pub mod repo;
pub mod titles;

pub use config::AppConfig;
pub use error::GuildError;
pub use id::IdGenerator;
pub use model::{
    BattleGroup, BattleKnight, BattlePlan, BattleTask, Catalog, Member, PlanStatus, Role, Season,
    TitleAssignment,
};
pub use repo::GuildRepository;
