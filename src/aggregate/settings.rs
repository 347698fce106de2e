use bevy::prelude::*;
use clap::{
    Args,
    ValueEnum,
};
use serde::{
    Deserialize,
    Serialize,
};


#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Hash,
    PartialEq,
    Reflect,
    Serialize,
    Deserialize,
    ValueEnum,
)]
pub enum ShMergePolicy {
    /// Keep SH when every merged asset carries it.
    #[default]
    Merge,
    /// Never carry SH in the aggregate.
    Discard,
}


#[derive(
    Args,
    Clone,
    Debug,
    PartialEq,
    Reflect,
    Resource,
    Serialize,
    Deserialize,
)]
#[reflect(Resource)]
pub struct AggregateSettings {
    /// Upper bound on the merged splat count.
    #[arg(long, default_value_t = u32::MAX)]
    pub max_splats: u32,

    #[arg(long, value_enum, default_value_t = ShMergePolicy::Merge)]
    pub sh_policy: ShMergePolicy,
}

impl Default for AggregateSettings {
    fn default() -> Self {
        Self {
            max_splats: u32::MAX,
            sh_policy: ShMergePolicy::default(),
        }
    }
}
