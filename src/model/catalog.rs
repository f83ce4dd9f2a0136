use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::nobility::Season;
use crate::error::GuildError;

/// Lowest and highest troop tier.
pub const MIN_TIER: u8 = 1;
pub const MAX_TIER: u8 = 5;

/// Highest base leadership a troop may cost; no weapon carries more.
pub const MAX_TROOP_LEADERSHIP: u32 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Troop {
    pub id: String,
    pub name: String,
    pub tier: u8,
    /// Base leadership cost before doctrine.
    pub leadership: u32,
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Weapon {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Artillery {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NobilityTitle {
    pub id: String,
    pub name: String,
}

/// The shared reference lists, stored together as one `masterData` document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default)]
    pub troops: Vec<Troop>,
    #[serde(default)]
    pub weapons: Vec<Weapon>,
    #[serde(default)]
    pub artillery: Vec<Artillery>,
    #[serde(default)]
    pub nobility_titles: Vec<NobilityTitle>,
    #[serde(default)]
    pub seasons: Vec<Season>,
}

/// Case-insensitive name ordering with an exact tiebreak, used for every
/// name-sorted listing.
pub fn by_name(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

fn require_name(kind: &str, name: &str) -> Result<(), GuildError> {
    if name.trim().is_empty() {
        return Err(GuildError::validation(format!("{kind} name is required")));
    }
    Ok(())
}

/// Replace the item with the same id, or append it.
fn upsert_by_id<T>(items: &mut Vec<T>, item: T, id_of: impl Fn(&T) -> &str) {
    let id = id_of(&item).to_string();
    match items.iter_mut().find(|existing| id_of(existing) == id) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
}

fn remove_by_id<T>(items: &mut Vec<T>, id: &str, id_of: impl Fn(&T) -> &str) -> bool {
    let before = items.len();
    items.retain(|item| id_of(item) != id);
    items.len() != before
}

impl Catalog {
    /// The catalog a fresh deployment starts with.
    pub fn seeded() -> Self {
        Self {
            troops: DEFAULT_TROOPS
                .iter()
                .map(|&(id, name, tier, leadership)| Troop {
                    id: id.to_string(),
                    name: name.to_string(),
                    tier,
                    leadership,
                    image_url: placeholder_image(id),
                })
                .collect(),
            weapons: DEFAULT_WEAPONS
                .iter()
                .map(|&(id, name)| Weapon {
                    id: id.to_string(),
                    name: name.to_string(),
                    image_url: placeholder_image(id),
                })
                .collect(),
            artillery: DEFAULT_ARTILLERY
                .iter()
                .map(|&(id, name)| Artillery {
                    id: id.to_string(),
                    name: name.to_string(),
                    image_url: placeholder_image(id),
                })
                .collect(),
            nobility_titles: DEFAULT_TITLES
                .iter()
                .map(|&(id, name)| NobilityTitle {
                    id: id.to_string(),
                    name: name.to_string(),
                })
                .collect(),
            seasons: Vec::new(),
        }
    }

    pub fn troop(&self, id: &str) -> Option<&Troop> {
        self.troops.iter().find(|t| t.id == id)
    }

    pub fn weapon(&self, id: &str) -> Option<&Weapon> {
        self.weapons.iter().find(|w| w.id == id)
    }

    pub fn artillery_piece(&self, id: &str) -> Option<&Artillery> {
        self.artillery.iter().find(|a| a.id == id)
    }

    pub fn title(&self, id: &str) -> Option<&NobilityTitle> {
        self.nobility_titles.iter().find(|t| t.id == id)
    }

    pub fn upsert_troop(&mut self, troop: Troop) -> Result<(), GuildError> {
        require_name("troop", &troop.name)?;
        if !(MIN_TIER..=MAX_TIER).contains(&troop.tier) {
            return Err(GuildError::validation(format!(
                "troop tier must be between {MIN_TIER} and {MAX_TIER}, got {}",
                troop.tier
            )));
        }
        if troop.leadership > MAX_TROOP_LEADERSHIP {
            return Err(GuildError::validation(format!(
                "troop leadership must be at most {MAX_TROOP_LEADERSHIP}, got {}",
                troop.leadership
            )));
        }
        upsert_by_id(&mut self.troops, troop, |t| t.id.as_str());
        Ok(())
    }

    pub fn remove_troop(&mut self, id: &str) -> bool {
        remove_by_id(&mut self.troops, id, |t| t.id.as_str())
    }

    pub fn upsert_weapon(&mut self, weapon: Weapon) -> Result<(), GuildError> {
        require_name("weapon", &weapon.name)?;
        upsert_by_id(&mut self.weapons, weapon, |w| w.id.as_str());
        Ok(())
    }

    pub fn remove_weapon(&mut self, id: &str) -> bool {
        remove_by_id(&mut self.weapons, id, |w| w.id.as_str())
    }

    pub fn upsert_artillery(&mut self, piece: Artillery) -> Result<(), GuildError> {
        require_name("artillery", &piece.name)?;
        upsert_by_id(&mut self.artillery, piece, |a| a.id.as_str());
        Ok(())
    }

    pub fn remove_artillery(&mut self, id: &str) -> bool {
        remove_by_id(&mut self.artillery, id, |a| a.id.as_str())
    }

    /// Add a new title or rename an existing one.
    pub fn upsert_title(&mut self, title: NobilityTitle) -> Result<(), GuildError> {
        require_name("title", &title.name)?;
        upsert_by_id(&mut self.nobility_titles, title, |t| t.id.as_str());
        Ok(())
    }

    pub fn remove_title(&mut self, id: &str) -> bool {
        remove_by_id(&mut self.nobility_titles, id, |t| t.id.as_str())
    }
}

fn placeholder_image(id: &str) -> String {
    format!("https://picsum.photos/seed/{id}/100/100")
}

/// (id, name, tier, base leadership)
const DEFAULT_TROOPS: &[(&str, &str, u8, u32)] = &[
    ("t5_iron_reapers", "Iron Reapers", 5, 300),
    ("t5_pavise_crossbowmen", "Pavise Crossbowmen", 5, 280),
    ("t5_tercios_arquebusiers", "Tercios Arquebusiers", 5, 280),
    ("t5_shenji_grenadiers", "Shenji Grenadiers", 5, 315),
    ("t5_cataphract_lancers", "Cataphract Lancers", 5, 305),
    ("t5_winged_hussars", "Winged Hussars", 5, 305),
    ("t5_fire_lancers", "Fire Lancers", 5, 285),
    ("t5_monastic_knights", "Monastic Knights", 5, 295),
    ("t5_rattan_rangers", "Rattan Rangers", 5, 295),
    ("t5_kheshigs", "Kheshigs", 5, 300),
    ("t5_falconetti_gunners", "Falconetti Gunners", 5, 300),
    ("t5_silahdars", "Silahdars", 5, 300),
    ("t5_siphonarioi", "Siphonarioi", 5, 300),
    ("t5_liao_rangers", "Liao Rangers", 5, 315),
    ("t5_shield_maidens", "Shield Maidens", 5, 280),
    ("t5_modao_battalion", "Modao Battalion", 5, 310),
    ("t5_houndsmen", "Houndsmen", 5, 310),
    ("t5_chevaliers", "Chevaliers", 5, 340),
    ("t5_varangian_guards", "Varangian Guards", 5, 290),
    ("t5_retiarii", "Retiarii", 5, 305),
    ("t5_hashashins", "Hashashins", 5, 295),
    ("t5_yanyuedao_cavalry", "Yanyuedao Cavalry", 5, 320),
    ("t5_orochis_samourais", "Orochis Samourais", 5, 295),
    ("t5_zweihanders", "Zweihanders", 5, 310),
    ("t5_queen_paladins", "Queen Paladins", 5, 295),
    ("t5_xuanjia_heavy_cavalry", "Xuanjia Heavy Cavalry", 5, 325),
    ("t5_sunward_phalanx", "Sunward Phalanx", 5, 300),
    ("t5_lionrar_crew", "Lionrar Crew", 5, 320),
    ("t5_spartan_chosen", "Spartan Chosen", 5, 305),
    ("t5_hwarang", "Hwarang", 5, 290),
    ("t5_empire_chariot", "Empire Chariot", 5, 310),
    ("t4_halberdier_sergeants", "Halberdier Sergeants", 4, 225),
    ("t4_imperial_pikemen", "Imperial Pikemen", 4, 225),
    ("t4_palace_guards", "Palace Guards", 4, 230),
    ("t4_imperial_spearmen", "Imperial Spearmen", 4, 235),
    ("t4_javelin_sergeants", "Javelin Sergeants", 4, 220),
    ("t4_imperial_javelineers", "Imperial Javelineers", 4, 230),
    ("t4_longbowmen", "Longbowmen", 4, 225),
    ("t4_imperial_archers", "Imperial Archers", 4, 220),
    ("t4_kriegsrat_fusiliers", "Kriegsrat Fusiliers", 4, 225),
    ("t4_imperial_arquebusiers", "Imperial Arquebusiers", 4, 230),
    ("t4_yeomen", "Yeomen", 4, 225),
    ("t4_prefecture_cavalry", "Prefecture Cavalry", 4, 180),
    ("t4_dagger_axe_lancers", "Dagger-Axe Lancers", 4, 275),
    ("t4_spear_sergeants", "Spear Sergeants", 4, 215),
    ("t4_men_at_arms", "Men at Arms", 4, 235),
    ("t4_tseregs", "Tseregs", 4, 220),
    ("t4_fortebraccio", "Fortebraccio", 4, 220),
    ("t4_symmachean_stalwarts", "Symmachean Stalwarts", 4, 240),
    ("t4_berserkers", "Berserkers", 4, 220),
    ("t4_axe_raiders", "Axe Raiders", 4, 220),
    ("t3_halberdiers", "Halberdiers", 3, 150),
    ("t3_prefecture_guards", "Prefecture Guards", 3, 155),
    ("t3_fire_archers", "Fire Archers", 3, 160),
    ("t3_namkhan_archers", "Namkhan Archers", 3, 155),
    ("t3_condottieri", "Condottieri", 3, 160),
    ("t3_bagpipers", "Bagpipers", 3, 90),
    ("t2_pike_militia", "Pike Militia", 2, 95),
    ("t2_ironcap_swordsmen", "Ironcap Swordsmen", 2, 75),
    ("t2_demesne_javelineers", "Demesne Javelineers", 2, 80),
    ("t1_serfs", "Serfs", 1, 40),
    ("t1_woodcutters", "Woodcutters", 1, 40),
];

const DEFAULT_WEAPONS: &[(&str, &str)] = &[
    ("w_shortbow", "Arco corto"),
    ("w_longbow", "Arco largo"),
    ("w_scimitar", "Cimitarra"),
    ("w_dual_blades", "Doble empuñadura"),
    ("w_shotgun", "Escopeta"),
    ("w_shortsword", "Espada corta y escudo"),
    ("w_longsword", "Espada larga y escudo"),
    ("w_glaive", "Guja"),
    ("w_poleaxe", "Hacha de petos"),
    ("w_spear", "Lanza"),
    ("w_spear_shield", "Lanza y escudo"),
    ("w_maul", "Martillo"),
    ("w_nodachi", "Nodachi"),
    ("w_pike", "Pica"),
];

const DEFAULT_ARTILLERY: &[(&str, &str)] = &[
    ("art_bombard", "Bombarda"),
    ("art_catapult", "Catapulta"),
    ("art_flaming_comet", "Cometa Llameante"),
    ("art_siege_ballista", "Balista de Asedio"),
    ("art_war_rockets", "Cohetes de Guerra"),
    ("art_divine_crow", "Cuervo Divino (pajaritos)"),
    ("art_cannon", "Cañón"),
    ("art_culverin", "Culebrina"),
    ("art_mortar", "Mortero"),
    ("art_grapeshot", "Metralla"),
    ("art_scorpion", "Scorpion"),
    ("art_hwacha", "Lanzador Hwacha"),
    ("art_siege_tower", "Torre de Asedio"),
    ("art_trebuchet", "Trebuchet"),
    ("art_battering_ram", "Ariete"),
];

const DEFAULT_TITLES: &[(&str, &str)] = &[
    ("title_1", "Favor del Comandante"),
    ("title_2", "Héroe de la Semana"),
    ("title_3", "Estratega Maestro"),
    ("title_4", "Defensor Leal"),
    ("title_5", "Conquistador Audaz"),
];
