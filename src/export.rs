use crate::model_data::RawModelData;
use crate::runtime::RuntimeRig;
use tracing::trace;

pub const POSE_FILE_NAME: &str = "animation.bvh";
pub const MODEL_FILE_NAME: &str = "deformed_model.dae";

const CHANNELS_LINE: &str =
    "CHANNELS 6 Xposition Yposition Zposition Xrotation Yrotation Zrotation";
const FRAME_TIME: &str = "0.033333";

/// Delivery collaborator: receives finished export artifacts as opaque
/// bytes. The crate has no knowledge of how delivery happens.
pub trait ExportSink {
    fn deliver(&mut self, file_name: &str, bytes: &[u8]);
}

/// External scene-graph serializer for the secondary export mode.
pub trait ModelSerializer {
    fn serialize(&self, model: &RawModelData) -> Vec<u8>;
}

/// Renders the current pose as a single-frame motion-capture hierarchy
/// document. `None` when the rig has no bones.
pub fn compose_document(rig: &RuntimeRig) -> Option<String> {
    let root = rig.export_root()?;
    let mut hierarchy = String::new();
    let mut order = Vec::with_capacity(rig.bone_count());
    write_joint(&mut hierarchy, rig, root, 0, true, &mut order);
    trace!(joints = order.len(), "serialized joint hierarchy");

    let mut document = String::from("HIERARCHY\n");
    document.push_str(&hierarchy);
    document.push_str("MOTION\n");
    document.push_str("Frames: 1\n");
    document.push_str(&format!("Frame Time: {}\n", FRAME_TIME));
    document.push_str(&motion_line(rig, &order));
    Some(document)
}

// One recursive pass emits the nested joint blocks AND collects the joint
// visitation order; the motion line is derived from that same order, so the
// two sections cannot fall out of step.
fn write_joint(
    out: &mut String,
    rig: &RuntimeRig,
    bone_id: usize,
    depth: usize,
    is_root: bool,
    order: &mut Vec<usize>,
) {
    order.push(bone_id);
    let bone = rig.bone(bone_id);
    let pad = "  ".repeat(depth);
    let keyword = if is_root { "ROOT" } else { "JOINT" };

    out.push_str(&format!("{}{} {}\n", pad, keyword, bone.joint_label()));
    out.push_str(&format!("{}{{\n", pad));
    let position = bone.transform.position;
    out.push_str(&format!(
        "{}  OFFSET {} {} {}\n",
        pad,
        format_channel(position.x),
        format_channel(position.y),
        format_channel(position.z)
    ));
    out.push_str(&format!("{}  {}\n", pad, CHANNELS_LINE));

    let children: Vec<usize> = rig.bone_children(bone_id).collect();
    if children.is_empty() {
        out.push_str(&format!("{}  End Site\n", pad));
        out.push_str(&format!("{}  {{\n", pad));
        out.push_str(&format!("{}    OFFSET 0.0 0.0 0.0\n", pad));
        out.push_str(&format!("{}  }}\n", pad));
    } else {
        for child_id in children {
            write_joint(out, rig, child_id, depth + 1, false, order);
        }
    }
    out.push_str(&format!("{}}}\n", pad));
}

// Channel values for the single captured frame, in joint visitation order:
// local position, then local rotation as intrinsic X-Y-Z Euler degrees.
fn motion_line(rig: &RuntimeRig, order: &[usize]) -> String {
    let mut values = Vec::with_capacity(order.len() * 6);
    for &bone_id in order {
        let transform = &rig.bone(bone_id).transform;
        values.push(format_channel(transform.position.x));
        values.push(format_channel(transform.position.y));
        values.push(format_channel(transform.position.z));
        let (rx, ry, rz) = transform.rotation.euler_angles();
        values.push(format_channel(rx.to_degrees()));
        values.push(format_channel(ry.to_degrees()));
        values.push(format_channel(rz.to_degrees()));
    }
    let mut line = values.join(" ");
    line.push('\n');
    line
}

fn format_channel(value: f32) -> String {
    // collapse -0.0 so zero always prints the same way
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{:.6}", value)
}

#[cfg(test)]
mod tests {
    use super::format_channel;

    #[test]
    fn channel_values_use_six_decimal_fixed_point() {
        assert_eq!(format_channel(1.0), "1.000000");
        assert_eq!(format_channel(0.0), "0.000000");
        assert_eq!(format_channel(-0.0), "0.000000");
        assert_eq!(format_channel(-2.5), "-2.500000");
        assert_eq!(format_channel(0.0000004), "0.000000");
    }
}
