pub mod model_data;
pub mod shared_types;
pub mod runtime;
pub mod export;

#[cfg(test)]
mod tests {
    use crate::export::{compose_document, ExportSink, ModelSerializer};
    use crate::model_data::RawModelData;
    use crate::runtime::EditorSession;

    struct RecordingSink {
        deliveries: Vec<(String, Vec<u8>)>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self { deliveries: Vec::new() }
        }
    }

    impl ExportSink for RecordingSink {
        fn deliver(&mut self, file_name: &str, bytes: &[u8]) {
            self.deliveries.push((file_name.to_string(), bytes.to_vec()));
        }
    }

    struct JsonModelSerializer;

    impl ModelSerializer for JsonModelSerializer {
        fn serialize(&self, model: &RawModelData) -> Vec<u8> {
            serde_json::to_vec(model).unwrap()
        }
    }

    fn figure_session() -> EditorSession {
        let mut session = EditorSession::new();
        session
            .load_model(include_bytes!("test_assets/figure_model.json"), "figure")
            .unwrap();
        session
    }

    fn exported_document(session: &EditorSession) -> String {
        compose_document(session.rig().unwrap()).unwrap()
    }

    fn motion_tokens(document: &str) -> Vec<f32> {
        document
            .lines()
            .last()
            .unwrap()
            .split(' ')
            .map(|it| it.parse::<f32>().unwrap())
            .collect()
    }

    #[test]
    fn three_bone_figure_produces_expected_document() {
        let session = figure_session();
        let expected = "\
HIERARCHY
ROOT R
{
  OFFSET 0.000000 0.000000 0.000000
  CHANNELS 6 Xposition Yposition Zposition Xrotation Yrotation Zrotation
  JOINT A
  {
    OFFSET 1.000000 0.000000 0.000000
    CHANNELS 6 Xposition Yposition Zposition Xrotation Yrotation Zrotation
    JOINT B
    {
      OFFSET 0.000000 1.000000 0.000000
      CHANNELS 6 Xposition Yposition Zposition Xrotation Yrotation Zrotation
      End Site
      {
        OFFSET 0.0 0.0 0.0
      }
    }
  }
}
MOTION
Frames: 1
Frame Time: 0.033333
0.000000 0.000000 0.000000 0.000000 0.000000 0.000000 \
1.000000 0.000000 0.000000 0.000000 0.000000 0.000000 \
0.000000 1.000000 0.000000 0.000000 0.000000 0.000000
";
        assert_eq!(exported_document(&session), expected);
    }

    #[test]
    fn root_keyword_appears_exactly_once() {
        let session = figure_session();
        let document = exported_document(&session);
        assert!(document.lines().nth(1).unwrap().starts_with("ROOT "));
        assert_eq!(document.matches("ROOT ").count(), 1);
    }

    #[test]
    fn root_keyword_is_structural_even_with_shared_names() {
        let mut session = EditorSession::new();
        session
            .load_model(include_bytes!("test_assets/props_model.json"), "twins")
            .unwrap();
        let document = exported_document(&session);
        assert_eq!(document.lines().nth(1).unwrap(), "ROOT T");
        assert_eq!(document.matches("ROOT ").count(), 1);
        assert_eq!(document.matches("JOINT T").count(), 1);
    }

    #[test]
    fn every_leaf_joint_gets_one_end_site() {
        let session = figure_session();
        let document = exported_document(&session);
        assert_eq!(document.matches("End Site").count(), 1);
        assert_eq!(document.matches("OFFSET 0.0 0.0 0.0").count(), 1);
    }

    #[test]
    fn offsets_are_six_decimal_fixed_point() {
        let mut session = EditorSession::new();
        session
            .load_model(include_bytes!("test_assets/props_model.json"), "crane")
            .unwrap();
        let document = exported_document(&session);
        assert!(document.contains("OFFSET 1.000000 0.000000 -2.500000"));
        assert!(document.contains("OFFSET 0.000000 2.000000 0.000000"));
    }

    #[test]
    fn unnamed_bones_get_synthetic_joint_labels() {
        let mut session = EditorSession::new();
        session
            .load_model(include_bytes!("test_assets/props_model.json"), "crane")
            .unwrap();
        let document = exported_document(&session);
        assert!(document.contains("JOINT bone_1"));
    }

    #[test]
    fn motion_line_has_six_values_per_bone() {
        let session = figure_session();
        let document = exported_document(&session);
        assert_eq!(motion_tokens(&document).len(), 18);
    }

    #[test]
    fn repeated_export_is_byte_identical() {
        let session = figure_session();
        assert_eq!(exported_document(&session), exported_document(&session));
    }

    #[test]
    fn empty_bone_set_delivers_nothing() {
        let mut session = EditorSession::new();
        session
            .load_model(include_bytes!("test_assets/figure_model.json"), "empty")
            .unwrap();
        let mut sink = RecordingSink::new();
        session.export_pose(&mut sink);
        assert!(sink.deliveries.is_empty());
    }

    #[test]
    fn export_without_a_model_delivers_nothing() {
        let mut session = figure_session();
        session.clear_model();
        let mut sink = RecordingSink::new();
        session.export_pose(&mut sink);
        session.export_model(&JsonModelSerializer, &mut sink);
        assert!(sink.deliveries.is_empty());
    }

    #[test]
    fn exported_pose_is_delivered_as_bvh_file() {
        let session = figure_session();
        let mut sink = RecordingSink::new();
        session.export_pose(&mut sink);
        assert_eq!(sink.deliveries.len(), 1);
        assert_eq!(sink.deliveries[0].0, "animation.bvh");
        assert!(sink.deliveries[0].1.starts_with(b"HIERARCHY\n"));
    }

    #[test]
    fn posed_bones_show_up_in_the_motion_line() {
        let mut session = figure_session();
        {
            let rig = session.rig_mut().unwrap();
            let a = rig.get_bone_by_name("A").unwrap();
            let b = rig.get_bone_by_name("B").unwrap();
            let mut bones = rig.pose_bones();
            bones[a].transform.position.y = 2.0;
            bones[b].transform.rotation = nalgebra::UnitQuaternion::from_euler_angles(
                0.0,
                0.0,
                std::f32::consts::FRAC_PI_2,
            );
        }
        let document = exported_document(&session);
        let tokens = motion_tokens(&document);
        assert_eq!(tokens.len(), 18);
        // group 1 is joint A: position channels reflect the translation
        assert!((tokens[7] - 2.0).abs() < 1e-6);
        // group 2 is joint B: Z rotation channel reads in degrees
        assert!((tokens[17] - 90.0).abs() < 1e-3);
    }

    #[test]
    fn pose_preset_applies_by_bone_name() {
        let mut session = figure_session();
        session
            .apply_pose_preset(include_bytes!("test_assets/figure_pose.ron"))
            .unwrap();
        let document = exported_document(&session);
        let tokens = motion_tokens(&document);
        assert!((tokens[7] - 2.0).abs() < 1e-6);
        assert!((tokens[17] - 90.0).abs() < 1e-3);
    }

    #[test]
    fn world_positions_compose_parent_chains() {
        let mut session = figure_session();
        let rig = session.rig_mut().unwrap();
        let b = rig.get_bone_by_name("B").unwrap();
        let world = rig.get_bone_world_position(b);
        assert!((world.x - 1.0).abs() < 1e-4);
        assert!((world.y - 1.0).abs() < 1e-4);
        assert!(world.z.abs() < 1e-4);

        let r = rig.get_bone_by_name("R").unwrap();
        {
            let mut bones = rig.pose_bones();
            bones[r].transform.rotation = nalgebra::UnitQuaternion::from_euler_angles(
                0.0,
                0.0,
                std::f32::consts::FRAC_PI_2,
            );
        }
        rig.update_matrices();
        let world = rig.get_bone_world_position(b);
        assert!((world.x + 1.0).abs() < 1e-4);
        assert!((world.y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn bone_tip_follows_length_along_local_x() {
        let mut session = EditorSession::new();
        session
            .load_model(include_bytes!("test_assets/props_model.json"), "crane")
            .unwrap();
        let rig = session.rig().unwrap();
        let base = rig.get_bone_by_name("base").unwrap();
        let tip = rig.get_bone_world_tip(base);
        assert!((tip.x - 2.5).abs() < 1e-4);
        assert!(tip.y.abs() < 1e-4);
        assert!((tip.z + 2.5).abs() < 1e-4);
    }

    #[test]
    fn reset_pose_restores_the_rest_export() {
        let mut session = figure_session();
        let rest_document = exported_document(&session);
        let rig = session.rig_mut().unwrap();
        let a = rig.get_bone_by_name("A").unwrap();
        {
            let mut bones = rig.pose_bones();
            bones[a].transform.position.y = 3.0;
        }
        rig.update_matrices();
        assert_ne!(exported_document(&session), rest_document);

        session.rig_mut().unwrap().reset_pose();
        assert_eq!(exported_document(&session), rest_document);
    }

    #[test]
    fn model_export_reserializes_the_posed_scene() {
        let mut session = figure_session();
        {
            let rig = session.rig_mut().unwrap();
            let a = rig.get_bone_by_name("A").unwrap();
            let mut bones = rig.pose_bones();
            bones[a].transform.position.y = 2.0;
        }
        let mut sink = RecordingSink::new();
        session.export_model(&JsonModelSerializer, &mut sink);
        assert_eq!(sink.deliveries.len(), 1);
        assert_eq!(sink.deliveries[0].0, "deformed_model.dae");

        let round_trip: RawModelData = serde_json::from_slice(&sink.deliveries[0].1).unwrap();
        let rig = round_trip.rigs.iter().find(|it| it.name == "figure").unwrap();
        let a = rig.bones.iter().find(|it| it.name == "A").unwrap();
        assert!((a.transform.y - 2.0).abs() < 1e-6);
        // non-bone nodes survive the round trip untouched
        assert_eq!(rig.meshes.len(), 1);
        assert_eq!(rig.meshes[0].name, "body");
    }

    #[test]
    fn loading_a_missing_rig_is_an_error() {
        let mut session = EditorSession::new();
        let result = session.load_model(include_bytes!("test_assets/figure_model.json"), "nope");
        assert!(result.is_err());
    }
}
