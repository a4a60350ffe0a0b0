//! Tunables for the decision engine: intervals, TTLs, thresholds and
//! probabilities. Defaults mirror the values the behavior was tuned with.

use serde::{Deserialize, Serialize};

/// Inclusive millisecond range, e.g. how long an observation break lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeMs {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl RangeMs {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub fn is_ordered(&self) -> bool {
        self.min_ms <= self.max_ms
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrainConfig {
    /// Master switch for autonomous behavior.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_scan_interval")]
    pub scan_interval_ms: u64,

    #[serde(default = "default_decision_interval")]
    pub decision_interval_ms: u64,

    #[serde(default = "default_social_interval")]
    pub social_interval_ms: u64,

    /// Hard cap on how long any task may stay active.
    #[serde(default = "default_task_timeout")]
    pub task_timeout_ms: u64,

    /// Pause after spawning or being addressed in chat.
    #[serde(default = "default_idle_pause")]
    pub idle_pause_ms: u64,

    /// Pause after a chat command (manual override).
    #[serde(default = "default_manual_pause")]
    pub manual_pause_ms: u64,

    /// Mandatory pause after dying.
    #[serde(default = "default_death_pause")]
    pub death_pause_ms: u64,

    #[serde(default = "default_follow_distance")]
    pub follow_distance: f64,

    #[serde(default = "default_follow_max_distance")]
    pub follow_max_distance: f64,

    #[serde(default = "default_wander_radius")]
    pub wander_radius: f64,

    #[serde(default = "default_item_pickup_radius")]
    pub item_pickup_radius: f64,

    /// A hostile closer than this triggers evasion.
    #[serde(default = "default_threat_radius")]
    pub threat_radius: f64,

    /// How far evasion runs from the threat.
    #[serde(default = "default_evade_distance")]
    pub evade_distance: f64,

    #[serde(default = "default_low_health")]
    pub low_health_threshold: f32,

    /// How long after taking damage the agent keeps evading.
    #[serde(default = "default_danger_cooldown")]
    pub danger_cooldown_ms: u64,

    #[serde(default = "default_resource_scan_radius")]
    pub resource_scan_radius: f64,

    #[serde(default = "default_resource_scan_count")]
    pub resource_scan_count: usize,

    #[serde(default = "default_true")]
    pub allow_mining: bool,

    #[serde(default = "default_true")]
    pub allow_wood: bool,

    #[serde(default = "default_true")]
    pub allow_collect: bool,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub combat: CombatConfig,

    #[serde(default)]
    pub group: GroupConfig,

    #[serde(default)]
    pub seek: SeekConfig,

    #[serde(default)]
    pub idle: IdleConfig,

    #[serde(default)]
    pub chat_delay: ChatDelayConfig,
}

fn default_true() -> bool {
    true
}
fn default_scan_interval() -> u64 {
    2_000
}
fn default_decision_interval() -> u64 {
    6_000
}
fn default_social_interval() -> u64 {
    45_000
}
fn default_task_timeout() -> u64 {
    60_000
}
fn default_idle_pause() -> u64 {
    15_000
}
fn default_manual_pause() -> u64 {
    20_000
}
fn default_death_pause() -> u64 {
    5_000
}
fn default_follow_distance() -> f64 {
    3.0
}
fn default_follow_max_distance() -> f64 {
    18.0
}
fn default_wander_radius() -> f64 {
    32.0
}
fn default_item_pickup_radius() -> f64 {
    12.0
}
fn default_threat_radius() -> f64 {
    8.0
}
fn default_evade_distance() -> f64 {
    8.0
}
fn default_low_health() -> f32 {
    12.0
}
fn default_danger_cooldown() -> u64 {
    15_000
}
fn default_resource_scan_radius() -> f64 {
    32.0
}
fn default_resource_scan_count() -> usize {
    6
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            scan_interval_ms: default_scan_interval(),
            decision_interval_ms: default_decision_interval(),
            social_interval_ms: default_social_interval(),
            task_timeout_ms: default_task_timeout(),
            idle_pause_ms: default_idle_pause(),
            manual_pause_ms: default_manual_pause(),
            death_pause_ms: default_death_pause(),
            follow_distance: default_follow_distance(),
            follow_max_distance: default_follow_max_distance(),
            wander_radius: default_wander_radius(),
            item_pickup_radius: default_item_pickup_radius(),
            threat_radius: default_threat_radius(),
            evade_distance: default_evade_distance(),
            low_health_threshold: default_low_health(),
            danger_cooldown_ms: default_danger_cooldown(),
            resource_scan_radius: default_resource_scan_radius(),
            resource_scan_count: default_resource_scan_count(),
            allow_mining: true,
            allow_wood: true,
            allow_collect: true,
            memory: MemoryConfig::default(),
            combat: CombatConfig::default(),
            group: GroupConfig::default(),
            seek: SeekConfig::default(),
            idle: IdleConfig::default(),
            chat_delay: ChatDelayConfig::default(),
        }
    }
}

/// Time-to-live for every class of remembered observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_player_forget")]
    pub player_forget_ms: u64,

    #[serde(default = "default_remote_player_forget")]
    pub remote_player_forget_ms: u64,

    #[serde(default = "default_remote_hint_forget")]
    pub remote_hint_forget_ms: u64,

    #[serde(default = "default_hostile_forget")]
    pub hostile_forget_ms: u64,

    #[serde(default = "default_item_forget")]
    pub item_forget_ms: u64,

    #[serde(default = "default_resource_forget")]
    pub resource_forget_ms: u64,

    #[serde(default = "default_poi_forget")]
    pub poi_forget_ms: u64,
}

fn default_player_forget() -> u64 {
    90_000
}
fn default_remote_player_forget() -> u64 {
    300_000
}
fn default_remote_hint_forget() -> u64 {
    120_000
}
fn default_hostile_forget() -> u64 {
    20_000
}
fn default_item_forget() -> u64 {
    12_000
}
fn default_resource_forget() -> u64 {
    120_000
}
fn default_poi_forget() -> u64 {
    60_000
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            player_forget_ms: default_player_forget(),
            remote_player_forget_ms: default_remote_player_forget(),
            remote_hint_forget_ms: default_remote_hint_forget(),
            hostile_forget_ms: default_hostile_forget(),
            item_forget_ms: default_item_forget(),
            resource_forget_ms: default_resource_forget(),
            poi_forget_ms: default_poi_forget(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_engage_range")]
    pub engage_range: f64,

    /// Never start a fight at or below this health.
    #[serde(default = "default_engage_min_health")]
    pub engage_min_health: f32,

    /// Break off a fight at or below this health.
    #[serde(default = "default_disengage_health")]
    pub disengage_health: f32,

    #[serde(default = "default_max_chase")]
    pub max_chase_distance: f64,

    #[serde(default = "default_melee_range")]
    pub melee_range: f64,

    #[serde(default = "default_look_interval")]
    pub look_interval_ms: u64,

    #[serde(default = "default_swing_interval")]
    pub swing_interval_ms: u64,

    #[serde(default = "default_jump_chance")]
    pub jump_chance: f64,

    /// Quiet period after any fight ends.
    #[serde(default = "default_combat_cooldown")]
    pub cooldown_ms: u64,

    /// Mob kinds the agent never picks a fight with.
    #[serde(default = "default_excluded_mobs")]
    pub excluded_mobs: Vec<String>,
}

fn default_engage_range() -> f64 {
    6.0
}
fn default_engage_min_health() -> f32 {
    10.0
}
fn default_disengage_health() -> f32 {
    6.0
}
fn default_max_chase() -> f64 {
    16.0
}
fn default_melee_range() -> f64 {
    3.2
}
fn default_look_interval() -> u64 {
    250
}
fn default_swing_interval() -> u64 {
    650
}
fn default_jump_chance() -> f64 {
    0.3
}
fn default_combat_cooldown() -> u64 {
    8_000
}
fn default_excluded_mobs() -> Vec<String> {
    vec![
        "Creeper".into(),
        "Enderman".into(),
        "Ghast".into(),
        "Guardian".into(),
        "Elder Guardian".into(),
        "Warden".into(),
    ]
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            engage_range: default_engage_range(),
            engage_min_health: default_engage_min_health(),
            disengage_health: default_disengage_health(),
            max_chase_distance: default_max_chase(),
            melee_range: default_melee_range(),
            look_interval_ms: default_look_interval(),
            swing_interval_ms: default_swing_interval(),
            jump_chance: default_jump_chance(),
            cooldown_ms: default_combat_cooldown(),
            excluded_mobs: default_excluded_mobs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minimum visible players that count as a group.
    #[serde(default = "default_group_min_size")]
    pub min_size: usize,

    /// Players within this distance of each other form a cluster.
    #[serde(default = "default_group_radius")]
    pub radius: f64,

    #[serde(default = "default_group_follow_distance")]
    pub follow_distance: f64,

    /// Beyond this the group is ignored.
    #[serde(default = "default_group_leash")]
    pub leash_distance: f64,

    #[serde(default = "default_group_refresh")]
    pub refresh_ms: u64,

    /// Preferred member to follow when present in the group.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
}

fn default_group_min_size() -> usize {
    3
}
fn default_group_radius() -> f64 {
    10.0
}
fn default_group_follow_distance() -> f64 {
    5.0
}
fn default_group_leash() -> f64 {
    40.0
}
fn default_group_refresh() -> u64 {
    5_000
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_size: default_group_min_size(),
            radius: default_group_radius(),
            follow_distance: default_group_follow_distance(),
            leash_distance: default_group_leash(),
            refresh_ms: default_group_refresh(),
            anchor: None,
        }
    }
}

/// Searching for players that are connected but not rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeekConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Minimum gap between two unguided searches for the same player.
    #[serde(default = "default_seek_cooldown")]
    pub cooldown_ms: u64,

    #[serde(default = "default_seek_min_radius")]
    pub min_radius: f64,

    #[serde(default = "default_seek_max_radius")]
    pub max_radius: f64,
}

fn default_seek_cooldown() -> u64 {
    45_000
}
fn default_seek_min_radius() -> f64 {
    48.0
}
fn default_seek_max_radius() -> f64 {
    96.0
}

impl Default for SeekConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_ms: default_seek_cooldown(),
            min_radius: default_seek_min_radius(),
            max_radius: default_seek_max_radius(),
        }
    }
}

/// Idle behaviors (observe, stroll) and the gesture layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdleConfig {
    #[serde(default = "default_gesture_interval")]
    pub gesture_interval_ms: u64,

    #[serde(default = "default_look_at_player_range")]
    pub look_at_player_range: f64,

    #[serde(default = "default_observation_chance")]
    pub observation_chance: f64,

    #[serde(default = "default_observation_duration")]
    pub observation_duration: RangeMs,

    #[serde(default = "default_observation_cooldown")]
    pub observation_cooldown_ms: u64,

    #[serde(default = "default_stroll_chance")]
    pub stroll_chance: f64,

    #[serde(default = "default_stroll_duration")]
    pub stroll_duration: RangeMs,

    #[serde(default = "default_stroll_cooldown")]
    pub stroll_cooldown_ms: u64,
}

fn default_gesture_interval() -> u64 {
    4_500
}
fn default_look_at_player_range() -> f64 {
    10.0
}
fn default_observation_chance() -> f64 {
    0.3
}
fn default_observation_duration() -> RangeMs {
    RangeMs::new(4_000, 9_000)
}
fn default_observation_cooldown() -> u64 {
    30_000
}
fn default_stroll_chance() -> f64 {
    0.55
}
fn default_stroll_duration() -> RangeMs {
    RangeMs::new(5_000, 9_000)
}
fn default_stroll_cooldown() -> u64 {
    25_000
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            gesture_interval_ms: default_gesture_interval(),
            look_at_player_range: default_look_at_player_range(),
            observation_chance: default_observation_chance(),
            observation_duration: default_observation_duration(),
            observation_cooldown_ms: default_observation_cooldown(),
            stroll_chance: default_stroll_chance(),
            stroll_duration: default_stroll_duration(),
            stroll_cooldown_ms: default_stroll_cooldown(),
        }
    }
}

/// Delay before ambient chat lines go out, so replies don't look instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatDelayConfig {
    #[serde(default = "default_chat_min")]
    pub min_ms: u64,

    #[serde(default = "default_chat_max")]
    pub max_ms: u64,
}

fn default_chat_min() -> u64 {
    800
}
fn default_chat_max() -> u64 {
    2_400
}

impl Default for ChatDelayConfig {
    fn default() -> Self {
        Self {
            min_ms: default_chat_min(),
            max_ms: default_chat_max(),
        }
    }
}

impl BrainConfig {
    /// Check ranges and floors. Returns the first problem found.
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.decision_interval_ms < 2_000 {
            return Err("brain.decision_interval_ms must be at least 2000".into());
        }
        if self.social_interval_ms < 12_000 {
            return Err("brain.social_interval_ms must be at least 12000".into());
        }
        if self.scan_interval_ms == 0 || self.idle.gesture_interval_ms == 0 {
            return Err("brain scan and gesture intervals must be > 0".into());
        }
        if self.task_timeout_ms == 0 {
            return Err("brain.task_timeout_ms must be > 0".into());
        }
        if self.follow_distance >= self.follow_max_distance {
            return Err("brain.follow_distance must be below follow_max_distance".into());
        }
        if self.combat.disengage_health > self.combat.engage_min_health {
            return Err("brain.combat.disengage_health must not exceed engage_min_health".into());
        }
        if self.group.follow_distance >= self.group.leash_distance {
            return Err("brain.group.follow_distance must be below leash_distance".into());
        }
        if self.group.min_size < 2 {
            return Err("brain.group.min_size must be at least 2".into());
        }
        if self.seek.min_radius > self.seek.max_radius {
            return Err("brain.seek.min_radius must not exceed max_radius".into());
        }
        if !self.idle.observation_duration.is_ordered() || !self.idle.stroll_duration.is_ordered() {
            return Err("brain.idle duration ranges must have min_ms <= max_ms".into());
        }
        if self.chat_delay.min_ms > self.chat_delay.max_ms {
            return Err("brain.chat_delay.min_ms must not exceed max_ms".into());
        }
        for (name, p) in [
            ("combat.jump_chance", self.combat.jump_chance),
            ("idle.observation_chance", self.idle.observation_chance),
            ("idle.stroll_chance", self.idle.stroll_chance),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(format!("brain.{name} must be between 0.0 and 1.0"));
            }
        }
        Ok(())
    }
}
