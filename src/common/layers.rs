use avian2d::prelude::*;

/// Physics collision layers.
///
/// Only the player carries a dynamic body; everything else the resolver
/// handles with its own distance tests, so the layer set stays small.
#[derive(PhysicsLayer, Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    #[default]
    Default,
    World,
    Player,
}
