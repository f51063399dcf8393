//! Per-domain variable identifiers.
//!
//! Each domain's variable space is a closed enum so handlers can match on it
//! exhaustively. Unknown ids decode to `None` and are answered with
//! "Unknown command" by the domain handler.

use strum::{EnumIter, FromRepr, IntoStaticStr};

macro_rules! variable_table {
    (
        $(#[$enum_meta:meta])*
        $name:ident {
            $($(#[$variant_meta:meta])* $variant:ident = $id:literal,)+
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, IntoStaticStr, EnumIter)]
        #[repr(u8)]
        #[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($(#[$variant_meta])* $variant = $id,)+
        }

        impl $name {
            /// Looks up a variable by its wire id.
            #[must_use]
            pub const fn from_id(id: u8) -> Option<Self> {
                Self::from_repr(id)
            }

            /// Returns the wire id.
            #[must_use]
            pub const fn id(self) -> u8 {
                self as u8
            }

            /// Returns the symbolic name, for diagnostics.
            #[must_use]
            pub fn name(self) -> &'static str {
                self.into()
            }
        }
    };
}

variable_table! {
    /// Pedestrian variables.
    PersonVar {
        /// Ids of all pedestrians currently in the scenario.
        IdList = 0x00,
        /// Number of pedestrians currently in the scenario.
        Count = 0x01,
        /// Smallest id not yet used by any pedestrian.
        NextFreeId = 0x02,
        /// Position with zero elevation.
        #[strum(serialize = "POS_3D")]
        Pos3d = 0x39,
        /// Current walking speed.
        Speed = 0x40,
        /// Planar position.
        #[strum(serialize = "POS_2D")]
        Pos2d = 0x42,
        /// Heading angle.
        Angle = 0x43,
        /// Body length (diameter).
        Length = 0x44,
        /// Display colour.
        Color = 0x45,
        /// Body width (diameter).
        Width = 0x4d,
        /// Pedestrian type label.
        Type = 0x4f,
        /// Road the pedestrian walks on.
        RoadId = 0x50,
        /// Accumulated waiting time.
        WaitingTime = 0x7a,
        /// Adds a pedestrian.
        Add = 0x80,
        /// Velocity vector.
        Velocity = 0xfa,
        /// Desired walking speed.
        FreeFlowSpeed = 0xfb,
        /// Whether a further target follows the current one.
        HasNextTarget = 0xfc,
        /// Index of the current target in the target list.
        NextTargetListIndex = 0xfd,
        /// Ordered list of target ids.
        TargetList = 0xfe,
    }
}

variable_table! {
    /// Obstacle variables.
    PolygonVar {
        /// Ids of all obstacles.
        IdList = 0x00,
        /// Number of obstacles.
        Count = 0x01,
        /// Centroid of the obstacle.
        #[strum(serialize = "POS_2D")]
        Pos2d = 0x42,
        /// Vertical extent of the bounding box.
        Length = 0x44,
        /// Display colour.
        Color = 0x45,
        /// Horizontal extent of the bounding box.
        Width = 0x4d,
        /// Outline as a closed path.
        Shape = 0x4e,
        /// Element type label.
        Type = 0x4f,
        /// Whether the outline is drawn filled.
        Filled = 0x55,
        /// Texture image path.
        ImageFile = 0x93,
    }
}

variable_table! {
    /// Vehicle variables.
    VehicleVar {
        /// Ids of all vehicles.
        IdList = 0x00,
        /// Number of vehicles.
        Count = 0x01,
        /// Current speed.
        Speed = 0x40,
        /// Planar position.
        #[strum(serialize = "POS_2D")]
        Pos2d = 0x42,
        /// Planned route.
        Route = 0x53,
    }
}

variable_table! {
    /// Global simulation variables.
    SimulationVar {
        /// Current simulated time in seconds.
        Time = 0x66,
        /// Current simulated time in milliseconds.
        TimeMs = 0x70,
        /// Pedestrians that entered during the last step.
        DepartedPersonIds = 0x74,
        /// Pedestrians that reached their final target during the last step.
        ArrivedPersonIds = 0x7a,
        /// Simulated seconds per step.
        DeltaT = 0x7b,
        /// Scenario bounding box as two corners.
        NetBoundingBox = 0x7c,
        /// Simulation configuration block.
        SimConfig = 0xf1,
        /// Name of the loaded scenario.
        ScenarioName = 0xf2,
        /// Identifiers of cache entries received with the scenario.
        CacheIds = 0xf3,
        /// Geographic coordinate reference.
        CoordRef = 0xf4,
    }
}

variable_table! {
    /// Scenario element variables.
    MiscVar {
        /// Ids of installed target changers.
        TargetChangerIds = 0x10,
        /// Installs a target changer.
        AddTargetChanger = 0x11,
        /// Removes a target changer.
        RemoveTargetChanger = 0x12,
        /// Pending stimuli as a JSON array.
        StimulusInfos = 0x20,
        /// Schedules stimuli.
        AddStimulusInfos = 0x21,
        /// Route choice instruction.
        RouteChoice = 0x30,
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn person_ids_round_trip() {
        for variable in PersonVar::iter() {
            assert_eq!(PersonVar::from_id(variable.id()), Some(variable));
        }
    }

    #[test]
    fn names_are_screaming_snake_case() {
        assert_eq!(PersonVar::Pos2d.name(), "POS_2D");
        assert_eq!(PersonVar::NextTargetListIndex.name(), "NEXT_TARGET_LIST_INDEX");
        assert_eq!(SimulationVar::NetBoundingBox.name(), "NET_BOUNDING_BOX");
    }

    #[test]
    fn unknown_ids_decode_to_none() {
        assert_eq!(PersonVar::from_id(0x99), None);
        assert_eq!(MiscVar::from_id(0x00), None);
    }
}
