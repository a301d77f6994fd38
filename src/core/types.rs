//! Shared value types
//!
//! Names used on the wire (attachment points, wearable layers) are the
//! lower-case labels controllers send in command options.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of an in-world object, avatar, group or inventory item
pub type ObjectId = Uuid;

/// Volume of a local chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatType {
    Whisper,
    Normal,
    Shout,
}

impl std::fmt::Display for ChatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatType::Whisper => write!(f, "whisper"),
            ChatType::Normal => write!(f, "normal"),
            ChatType::Shout => write!(f, "shout"),
        }
    }
}

/// A position in metres
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Avatar attachment points, in protocol order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttachmentPoint {
    Chest,
    Skull,
    LeftShoulder,
    RightShoulder,
    LeftHand,
    RightHand,
    LeftFoot,
    RightFoot,
    Spine,
    Pelvis,
    Mouth,
    Chin,
    LeftEar,
    RightEar,
    LeftEyeball,
    RightEyeball,
    Nose,
    RightUpperArm,
    RightForearm,
    LeftUpperArm,
    LeftForearm,
    RightHip,
    RightUpperLeg,
    RightLowerLeg,
    LeftHip,
    LeftUpperLeg,
    LeftLowerLeg,
    Stomach,
    LeftPec,
    RightPec,
    HudCenter2,
    HudTopRight,
    HudTop,
    HudTopLeft,
    HudCenter,
    HudBottomLeft,
    HudBottom,
    HudBottomRight,
    Neck,
    AvatarCenter,
}

impl AttachmentPoint {
    /// Every point in protocol order (index + 1 is the point number)
    pub const ALL: [AttachmentPoint; 40] = [
        AttachmentPoint::Chest,
        AttachmentPoint::Skull,
        AttachmentPoint::LeftShoulder,
        AttachmentPoint::RightShoulder,
        AttachmentPoint::LeftHand,
        AttachmentPoint::RightHand,
        AttachmentPoint::LeftFoot,
        AttachmentPoint::RightFoot,
        AttachmentPoint::Spine,
        AttachmentPoint::Pelvis,
        AttachmentPoint::Mouth,
        AttachmentPoint::Chin,
        AttachmentPoint::LeftEar,
        AttachmentPoint::RightEar,
        AttachmentPoint::LeftEyeball,
        AttachmentPoint::RightEyeball,
        AttachmentPoint::Nose,
        AttachmentPoint::RightUpperArm,
        AttachmentPoint::RightForearm,
        AttachmentPoint::LeftUpperArm,
        AttachmentPoint::LeftForearm,
        AttachmentPoint::RightHip,
        AttachmentPoint::RightUpperLeg,
        AttachmentPoint::RightLowerLeg,
        AttachmentPoint::LeftHip,
        AttachmentPoint::LeftUpperLeg,
        AttachmentPoint::LeftLowerLeg,
        AttachmentPoint::Stomach,
        AttachmentPoint::LeftPec,
        AttachmentPoint::RightPec,
        AttachmentPoint::HudCenter2,
        AttachmentPoint::HudTopRight,
        AttachmentPoint::HudTop,
        AttachmentPoint::HudTopLeft,
        AttachmentPoint::HudCenter,
        AttachmentPoint::HudBottomLeft,
        AttachmentPoint::HudBottom,
        AttachmentPoint::HudBottomRight,
        AttachmentPoint::Neck,
        AttachmentPoint::AvatarCenter,
    ];

    /// Protocol name of this point
    pub fn name(&self) -> &'static str {
        match self {
            AttachmentPoint::Chest => "chest",
            AttachmentPoint::Skull => "skull",
            AttachmentPoint::LeftShoulder => "left shoulder",
            AttachmentPoint::RightShoulder => "right shoulder",
            AttachmentPoint::LeftHand => "left hand",
            AttachmentPoint::RightHand => "right hand",
            AttachmentPoint::LeftFoot => "left foot",
            AttachmentPoint::RightFoot => "right foot",
            AttachmentPoint::Spine => "spine",
            AttachmentPoint::Pelvis => "pelvis",
            AttachmentPoint::Mouth => "mouth",
            AttachmentPoint::Chin => "chin",
            AttachmentPoint::LeftEar => "left ear",
            AttachmentPoint::RightEar => "right ear",
            AttachmentPoint::LeftEyeball => "left eyeball",
            AttachmentPoint::RightEyeball => "right eyeball",
            AttachmentPoint::Nose => "nose",
            AttachmentPoint::RightUpperArm => "r upper arm",
            AttachmentPoint::RightForearm => "r forearm",
            AttachmentPoint::LeftUpperArm => "l upper arm",
            AttachmentPoint::LeftForearm => "l forearm",
            AttachmentPoint::RightHip => "right hip",
            AttachmentPoint::RightUpperLeg => "r upper leg",
            AttachmentPoint::RightLowerLeg => "r lower leg",
            AttachmentPoint::LeftHip => "left hip",
            AttachmentPoint::LeftUpperLeg => "l upper leg",
            AttachmentPoint::LeftLowerLeg => "l lower leg",
            AttachmentPoint::Stomach => "stomach",
            AttachmentPoint::LeftPec => "left pec",
            AttachmentPoint::RightPec => "right pec",
            AttachmentPoint::HudCenter2 => "center 2",
            AttachmentPoint::HudTopRight => "top right",
            AttachmentPoint::HudTop => "top",
            AttachmentPoint::HudTopLeft => "top left",
            AttachmentPoint::HudCenter => "center",
            AttachmentPoint::HudBottomLeft => "bottom left",
            AttachmentPoint::HudBottom => "bottom",
            AttachmentPoint::HudBottomRight => "bottom right",
            AttachmentPoint::Neck => "neck",
            AttachmentPoint::AvatarCenter => "avatar center",
        }
    }

    /// Look up a point by its protocol name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }
}

/// Wearable clothing and body-part layers, in protocol order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WearableType {
    Gloves,
    Jacket,
    Pants,
    Shirt,
    Shoes,
    Skirt,
    Socks,
    Underpants,
    Undershirt,
    Skin,
    Eyes,
    Hair,
    Shape,
    Alpha,
    Tattoo,
    Physics,
}

impl WearableType {
    /// Every layer in protocol order
    pub const ALL: [WearableType; 16] = [
        WearableType::Gloves,
        WearableType::Jacket,
        WearableType::Pants,
        WearableType::Shirt,
        WearableType::Shoes,
        WearableType::Skirt,
        WearableType::Socks,
        WearableType::Underpants,
        WearableType::Undershirt,
        WearableType::Skin,
        WearableType::Eyes,
        WearableType::Hair,
        WearableType::Shape,
        WearableType::Alpha,
        WearableType::Tattoo,
        WearableType::Physics,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            WearableType::Gloves => "gloves",
            WearableType::Jacket => "jacket",
            WearableType::Pants => "pants",
            WearableType::Shirt => "shirt",
            WearableType::Shoes => "shoes",
            WearableType::Skirt => "skirt",
            WearableType::Socks => "socks",
            WearableType::Underpants => "underpants",
            WearableType::Undershirt => "undershirt",
            WearableType::Skin => "skin",
            WearableType::Eyes => "eyes",
            WearableType::Hair => "hair",
            WearableType::Shape => "shape",
            WearableType::Alpha => "alpha",
            WearableType::Tattoo => "tattoo",
            WearableType::Physics => "physics",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|w| w.name().eq_ignore_ascii_case(name))
    }

    /// Body parts can be replaced but never taken off
    pub fn is_body_part(&self) -> bool {
        matches!(
            self,
            WearableType::Skin | WearableType::Eyes | WearableType::Hair | WearableType::Shape
        )
    }
}
