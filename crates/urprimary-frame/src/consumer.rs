use crate::package::{
    CartesianInfo, ErrorCodeMessage, ForceModeData, GlobalVariablesSetupMessage,
    GlobalVariablesUpdateMessage, JointData, KeyMessage, KinematicsInfo, Package,
    ProgramLabelMessage, RobotModeData, RuntimeExceptionMessage, SafetyModeMessage, TextMessage,
    UndecodedPackage, VersionMessage,
};

/// Receives decoded packages, one slot per variant.
///
/// Every slot defaults to ignoring the package and returning `false`.
/// Implementors override the slots they care about and return `true` when
/// they handled the package.
#[allow(unused_variables)]
pub trait PackageConsumer {
    fn consume_robot_mode_data(&mut self, pkg: &RobotModeData) -> bool {
        false
    }

    fn consume_joint_data(&mut self, pkg: &JointData) -> bool {
        false
    }

    fn consume_cartesian_info(&mut self, pkg: &CartesianInfo) -> bool {
        false
    }

    fn consume_kinematics_info(&mut self, pkg: &KinematicsInfo) -> bool {
        false
    }

    fn consume_force_mode_data(&mut self, pkg: &ForceModeData) -> bool {
        false
    }

    fn consume_text_message(&mut self, pkg: &TextMessage) -> bool {
        false
    }

    fn consume_program_label_message(&mut self, pkg: &ProgramLabelMessage) -> bool {
        false
    }

    fn consume_version_message(&mut self, pkg: &VersionMessage) -> bool {
        false
    }

    fn consume_safety_mode_message(&mut self, pkg: &SafetyModeMessage) -> bool {
        false
    }

    fn consume_error_code_message(&mut self, pkg: &ErrorCodeMessage) -> bool {
        false
    }

    fn consume_key_message(&mut self, pkg: &KeyMessage) -> bool {
        false
    }

    fn consume_runtime_exception_message(&mut self, pkg: &RuntimeExceptionMessage) -> bool {
        false
    }

    fn consume_global_variables_setup_message(&mut self, pkg: &GlobalVariablesSetupMessage) -> bool {
        false
    }

    fn consume_global_variables_update_message(
        &mut self,
        pkg: &GlobalVariablesUpdateMessage,
    ) -> bool {
        false
    }

    /// Frames or sub-packages without a decoder.
    fn consume_undecoded(&mut self, pkg: &UndecodedPackage) -> bool {
        false
    }

    /// Dispatch any package to its slot.
    fn consume(&mut self, pkg: &Package) -> bool {
        pkg.consume_with(self)
    }
}

impl<C: PackageConsumer + ?Sized> PackageConsumer for Box<C> {
    fn consume_robot_mode_data(&mut self, pkg: &RobotModeData) -> bool {
        (**self).consume_robot_mode_data(pkg)
    }

    fn consume_joint_data(&mut self, pkg: &JointData) -> bool {
        (**self).consume_joint_data(pkg)
    }

    fn consume_cartesian_info(&mut self, pkg: &CartesianInfo) -> bool {
        (**self).consume_cartesian_info(pkg)
    }

    fn consume_kinematics_info(&mut self, pkg: &KinematicsInfo) -> bool {
        (**self).consume_kinematics_info(pkg)
    }

    fn consume_force_mode_data(&mut self, pkg: &ForceModeData) -> bool {
        (**self).consume_force_mode_data(pkg)
    }

    fn consume_text_message(&mut self, pkg: &TextMessage) -> bool {
        (**self).consume_text_message(pkg)
    }

    fn consume_program_label_message(&mut self, pkg: &ProgramLabelMessage) -> bool {
        (**self).consume_program_label_message(pkg)
    }

    fn consume_version_message(&mut self, pkg: &VersionMessage) -> bool {
        (**self).consume_version_message(pkg)
    }

    fn consume_safety_mode_message(&mut self, pkg: &SafetyModeMessage) -> bool {
        (**self).consume_safety_mode_message(pkg)
    }

    fn consume_error_code_message(&mut self, pkg: &ErrorCodeMessage) -> bool {
        (**self).consume_error_code_message(pkg)
    }

    fn consume_key_message(&mut self, pkg: &KeyMessage) -> bool {
        (**self).consume_key_message(pkg)
    }

    fn consume_runtime_exception_message(&mut self, pkg: &RuntimeExceptionMessage) -> bool {
        (**self).consume_runtime_exception_message(pkg)
    }

    fn consume_global_variables_setup_message(&mut self, pkg: &GlobalVariablesSetupMessage) -> bool {
        (**self).consume_global_variables_setup_message(pkg)
    }

    fn consume_global_variables_update_message(
        &mut self,
        pkg: &GlobalVariablesUpdateMessage,
    ) -> bool {
        (**self).consume_global_variables_update_message(pkg)
    }

    fn consume_undecoded(&mut self, pkg: &UndecodedPackage) -> bool {
        (**self).consume_undecoded(pkg)
    }
}
