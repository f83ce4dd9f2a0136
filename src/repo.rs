//! Typed access to the guild's collections on top of any [`DocumentStore`].
//!
//! Every write returns its `Result`; failures are also logged so a caller
//! that only shows a toast still leaves a trace.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::AppConfig;
use crate::db::collections::{BATTLE_PLANS, MASTER_DATA, MASTER_DATA_DOC, TITLE_ASSIGNMENTS, USERS};
use crate::db::{BatchOp, DocumentStore, Subscription, WriteMode};
use crate::error::GuildError;
use crate::id::IdGenerator;
use crate::identity::IdentityProvider;
use crate::model::{BattlePlan, Catalog, Member, Role, Season, StaffEdit, TitleAssignment};
use crate::planner;
use crate::titles::{self, WeekReplacement};

pub struct GuildRepository<S> {
    store: S,
}

fn logged<T>(result: Result<T, GuildError>, collection: &str, id: &str, action: &str) -> Result<T, GuildError> {
    match &result {
        Ok(_) => tracing::debug!(collection, id, action, "document written"),
        Err(e) => tracing::warn!(collection, id, action, error = %e, "document write failed"),
    }
    result
}

impl<S: DocumentStore> GuildRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn fetch<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<Option<T>, GuildError> {
        match self.store.get(collection, id).await? {
            Some(body) => Ok(Some(serde_json::from_value(body)?)),
            None => Ok(None),
        }
    }

    async fn fetch_all<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>, GuildError> {
        self.store
            .list(collection)
            .await?
            .into_iter()
            .map(|doc| serde_json::from_value(doc.body).map_err(GuildError::from))
            .collect()
    }

    async fn store_doc<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        value: &T,
        mode: WriteMode,
    ) -> Result<(), GuildError> {
        let result = match serde_json::to_value(value) {
            Ok(body) => self.store.put(collection, id, body, mode).await,
            Err(e) => Err(e.into()),
        };
        logged(result, collection, id, "put")
    }

    async fn remove_doc(&self, collection: &str, id: &str) -> Result<(), GuildError> {
        let result = self.store.delete(collection, id).await;
        logged(result, collection, id, "delete")
    }

    // Subscriptions

    /// Wait for the next change on `sub` and read the changed document back.
    /// `Some(Ok(None))` means it was deleted; `None` means the feed ended.
    pub async fn next_document<T: DeserializeOwned>(
        &self,
        sub: &mut Subscription,
    ) -> Option<Result<Option<T>, GuildError>> {
        let change = sub.next().await?;
        Some(self.fetch(&change.collection, &change.id).await)
    }

    /// Wait for the next change on `sub` and read its whole collection back.
    pub async fn next_snapshot<T: DeserializeOwned>(
        &self,
        sub: &mut Subscription,
    ) -> Option<Result<Vec<T>, GuildError>> {
        let change = sub.next().await?;
        Some(self.fetch_all(&change.collection).await)
    }

    // Catalog

    /// The catalog, or `NotFound` if it was never seeded.
    pub async fn catalog(&self) -> Result<Catalog, GuildError> {
        self.fetch(MASTER_DATA, MASTER_DATA_DOC)
            .await?
            .ok_or_else(|| GuildError::not_found("catalog", MASTER_DATA_DOC))
    }

    /// Load the catalog, writing the default one first if none exists.
    pub async fn ensure_catalog(&self) -> Result<Catalog, GuildError> {
        if let Some(catalog) = self.fetch(MASTER_DATA, MASTER_DATA_DOC).await? {
            return Ok(catalog);
        }
        let catalog = Catalog::seeded();
        self.save_catalog(&catalog).await?;
        tracing::info!(
            troops = catalog.troops.len(),
            weapons = catalog.weapons.len(),
            "default catalog seeded"
        );
        Ok(catalog)
    }

    pub async fn save_catalog(&self, catalog: &Catalog) -> Result<(), GuildError> {
        self.store_doc(MASTER_DATA, MASTER_DATA_DOC, catalog, WriteMode::Replace)
            .await
    }

    /// Replace only the season list inside the catalog document.
    pub async fn save_seasons(&self, seasons: &[Season]) -> Result<(), GuildError> {
        self.store_doc(
            MASTER_DATA,
            MASTER_DATA_DOC,
            &json!({ "seasons": seasons }),
            WriteMode::Merge,
        )
        .await
    }

    pub fn watch_catalog(&self) -> Subscription {
        self.store.subscribe_document(MASTER_DATA, MASTER_DATA_DOC)
    }

    // Members

    pub async fn members(&self) -> Result<Vec<Member>, GuildError> {
        self.fetch_all(USERS).await
    }

    pub async fn member(&self, uid: &str) -> Result<Member, GuildError> {
        self.fetch(USERS, uid)
            .await?
            .ok_or_else(|| GuildError::not_found("member", uid))
    }

    /// The signed-in member's profile, created on first sign-in. `None` when
    /// nobody is signed in.
    pub async fn ensure_profile(
        &self,
        identity: &impl IdentityProvider,
        config: &AppConfig,
    ) -> Result<Option<Member>, GuildError> {
        let Some(principal) = identity.current_principal() else {
            return Ok(None);
        };
        if let Some(member) = self.fetch::<Member>(USERS, &principal.id).await? {
            return Ok(Some(member));
        }
        let role = if config.first_user_commander && self.store.list(USERS).await?.is_empty() {
            Role::Commander
        } else {
            Role::Squire
        };
        let member = Member::new_profile(&principal, role);
        self.save_member(&member).await?;
        tracing::info!(uid = %member.uid, role = %member.role, "member profile created");
        Ok(Some(member))
    }

    /// Store a member's own profile (equipment edits).
    pub async fn save_member(&self, member: &Member) -> Result<(), GuildError> {
        self.store_doc(USERS, &member.uid, member, WriteMode::Replace)
            .await
    }

    /// Staff edit of `target_uid` by `actor`. Only the staff fields are written,
    /// so concurrent equipment edits by the member survive. A member removed
    /// in the meantime stays removed and the edit fails with `NotFound`.
    pub async fn update_staff(
        &self,
        actor: &Member,
        target_uid: &str,
        edit: StaffEdit,
    ) -> Result<Member, GuildError> {
        let target = self.member(target_uid).await?;
        let updated = actor.edit_staff(&target, edit)?;
        let patch = json!({
            "name": updated.name,
            "discordId": updated.discord_id,
            "role": updated.role,
        });
        self.store_doc(USERS, target_uid, &patch, WriteMode::Update)
            .await?;
        Ok(updated)
    }

    pub async fn remove_member(&self, actor: &Member, target_uid: &str) -> Result<(), GuildError> {
        let target = self.member(target_uid).await?;
        if !actor.can_delete(&target) {
            return Err(GuildError::Permission(format!(
                "{} may not remove {}",
                actor.name, target.name
            )));
        }
        self.remove_doc(USERS, target_uid).await
    }

    pub fn watch_members(&self) -> Subscription {
        self.store.subscribe_collection(USERS)
    }

    // Battle plans

    pub async fn plans(&self) -> Result<Vec<BattlePlan>, GuildError> {
        self.fetch_all(BATTLE_PLANS).await
    }

    pub async fn plan(&self, id: &str) -> Result<BattlePlan, GuildError> {
        self.fetch(BATTLE_PLANS, id)
            .await?
            .ok_or_else(|| GuildError::not_found("battle plan", id))
    }

    /// Create and store a new empty plan. Ids already present in the
    /// collection are skipped, so a fresh generator never overwrites a plan.
    pub async fn create_plan(
        &self,
        ids: &mut IdGenerator,
        name: &str,
        date: &str,
    ) -> Result<BattlePlan, GuildError> {
        loop {
            let plan = planner::create_plan(ids, name, date)?;
            if self.store.get(BATTLE_PLANS, plan.id()).await?.is_none() {
                self.save_plan(&plan).await?;
                return Ok(plan);
            }
            tracing::debug!(plan = plan.id(), "plan id already taken, drawing another");
        }
    }

    pub async fn save_plan(&self, plan: &BattlePlan) -> Result<(), GuildError> {
        self.store_doc(BATTLE_PLANS, plan.id(), plan, WriteMode::Replace)
            .await
    }

    pub async fn delete_plan(&self, id: &str) -> Result<(), GuildError> {
        self.remove_doc(BATTLE_PLANS, id).await
    }

    pub fn watch_plan(&self, id: &str) -> Subscription {
        self.store.subscribe_document(BATTLE_PLANS, id)
    }

    // Seasons and titles

    pub async fn start_season(
        &self,
        ids: &mut IdGenerator,
        name: &str,
        start_date: NaiveDate,
    ) -> Result<Season, GuildError> {
        let catalog = self.catalog().await?;
        let seasons = titles::start_season(&catalog.seasons, ids, name, start_date)?;
        self.save_seasons(&seasons).await?;
        titles::active_season(&seasons)
            .cloned()
            .ok_or_else(|| GuildError::invalid_state("no active season after starting one"))
    }

    pub async fn assignments(&self, season_id: &str) -> Result<Vec<TitleAssignment>, GuildError> {
        let all: Vec<TitleAssignment> = self.fetch_all(TITLE_ASSIGNMENTS).await?;
        Ok(all.into_iter().filter(|a| a.season_id == season_id).collect())
    }

    /// Replace every record for (`season_id`, `week`) in one atomic batch.
    pub async fn save_week(
        &self,
        season_id: &str,
        week: u32,
        by_member: &BTreeMap<String, Option<String>>,
    ) -> Result<WeekReplacement, GuildError> {
        let existing = self.assignments(season_id).await?;
        let replacement = titles::replace_week(&existing, season_id, week, by_member);

        let mut ops = Vec::with_capacity(replacement.records.len() + replacement.removed_ids.len());
        for record in &replacement.records {
            ops.push(BatchOp::Put {
                collection: TITLE_ASSIGNMENTS.to_string(),
                id: record.id.clone(),
                body: serde_json::to_value(record)?,
            });
        }
        for id in &replacement.removed_ids {
            ops.push(BatchOp::Delete {
                collection: TITLE_ASSIGNMENTS.to_string(),
                id: id.clone(),
            });
        }
        let key = format!("{season_id}/{week}");
        logged(self.store.batch(ops).await, TITLE_ASSIGNMENTS, &key, "batch")?;
        Ok(replacement)
    }

    pub fn watch_assignments(&self) -> Subscription {
        self.store.subscribe_collection(TITLE_ASSIGNMENTS)
    }
}
