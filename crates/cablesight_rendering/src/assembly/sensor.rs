//! # Sensor Module
//!
//! Hexagonal instrument housing clamped around the joint, one screen and
//! one status LED per face.
//!
//! ```text
//! sensor (at joint, X axis → cable tangent)
//! └── sensor-rotor (spins about the cable axis while scanning)
//!     ├── sensor-housing
//!     ├── screen-0 .. screen-5
//!     └── led-0 .. led-5
//! ```
//!
//! ## Screen orientation
//!
//! A screen quad faces +Z with its rows along +X. Face `i` has outward
//! normal at `φᵢ = i·60° + 30°` about the cable axis. Every screen is placed
//! with a single rotation about the cable axis by `θᵢ = φᵢ − 90°`, which maps
//! +Z onto the face normal and keeps +X along the cable. All six screens
//! therefore share the same handedness and the same "up" sense around the
//! ring: no face is mirrored or upside down. Orienting each quad with a
//! look-at against world up would flip the faces below the horizon, so the
//! rotation is derived from the face angle instead.

use std::f32::consts::FRAC_PI_2;

use cablesight_shared::{FaultMode, Quaternion, Vec3, SENSOR_FACES};

use crate::assembly::textures::{MapSlot, TextureLibrary};
use crate::backend::RenderBackend;
use crate::error::EngineResult;
use crate::scene::{
    hex_face_angle, hex_face_normal, Geometry, MaterialLayer, NodeId, PathCurve, SceneGraph, SharedTexture,
    Transform,
};

/// Distance from the cable axis to each flat face.
pub const HOUSING_APOTHEM: f32 = 1.05;
/// Bore of the housing.
pub const HOUSING_BORE: f32 = 0.86;
/// Length along the cable.
pub const HOUSING_LENGTH: f32 = 1.4;
/// Screen quad size (along the cable, around it).
pub const SCREEN_SIZE: (f32, f32) = (0.9, 0.45);
/// LED quad side.
pub const LED_SIZE: f32 = 0.08;

const LED_OFF_INTENSITY: f32 = 0.15;
const LED_ON_INTENSITY: f32 = 2.5;
const HEALTHY_LED: [f32; 3] = [0.1, 0.95, 0.3];

/// Rotation about the cable axis that puts a screen on face `face`.
#[must_use]
pub fn screen_rotation(face: usize) -> Quaternion {
    Quaternion::from_axis_angle(Vec3::X, hex_face_angle(face) - FRAC_PI_2)
}

/// LED color for a mode: green when healthy, the mode's accent otherwise.
#[must_use]
pub const fn led_color(mode: FaultMode) -> [f32; 3] {
    if mode.is_fault() {
        mode.accent_color()
    } else {
        HEALTHY_LED
    }
}

/// Handles and runtime state of the housing.
#[derive(Debug, Clone)]
pub struct SensorModule {
    /// Outer group, anchored at the joint.
    pub group: NodeId,
    /// Spinning group.
    pub rotor: NodeId,
    /// Housing mesh.
    pub housing: NodeId,
    /// Screen meshes, by face.
    pub screens: [NodeId; SENSOR_FACES],
    /// LED meshes, by face.
    pub leds: [NodeId; SENSOR_FACES],
    orbit_angle: f32,
    leds_lit: bool,
}

impl SensorModule {
    /// Current rotor angle (rad).
    #[must_use]
    pub const fn orbit_angle(&self) -> f32 {
        self.orbit_angle
    }

    /// LEDs currently lit.
    #[must_use]
    pub const fn leds_lit(&self) -> bool {
        self.leds_lit
    }

    /// Spins the rotor while scanning.
    ///
    /// # Errors
    ///
    /// `StaleNode` if the rotor is gone.
    pub fn advance_orbit(&mut self, graph: &mut SceneGraph, dt: f32, speed: f32, scanning: bool) -> EngineResult<()> {
        if !scanning || dt <= 0.0 {
            return Ok(());
        }
        self.orbit_angle = (self.orbit_angle + speed * dt).rem_euclid(std::f32::consts::TAU);
        graph.set_transform(
            self.rotor,
            Transform::IDENTITY.with_rotation(Quaternion::from_axis_angle(Vec3::X, self.orbit_angle)),
        )
    }

    /// Toggles the LEDs and colors them for `mode`. Returns the new state.
    ///
    /// # Errors
    ///
    /// `StaleNode` if an LED is gone.
    pub fn blink(&mut self, graph: &mut SceneGraph, mode: FaultMode) -> EngineResult<bool> {
        self.leds_lit = !self.leds_lit;
        let color = led_color(mode);
        let intensity = if self.leds_lit { LED_ON_INTENSITY } else { LED_OFF_INTENSITY };
        for &led in &self.leds {
            let layer = graph.material_mut(led, 0)?;
            layer.base_color = color;
            layer.emissive = color;
            layer.emissive_intensity = intensity;
        }
        Ok(self.leds_lit)
    }
}

/// Builds the housing around the joint at curve parameter `joint`.
///
/// `screen_maps[i]` is the texture for face `i`; a missing one leaves the
/// face blank.
///
/// # Errors
///
/// `InvalidGeometry` or a terminal backend error. On error the graph may
/// hold a partial module; the caller disposes it.
pub fn build_sensor<B: RenderBackend + ?Sized>(
    graph: &mut SceneGraph,
    backend: &mut B,
    parent: NodeId,
    curve: &PathCurve,
    joint: f32,
    library: &TextureLibrary,
    screen_maps: &[Option<SharedTexture>; SENSOR_FACES],
) -> EngineResult<SensorModule> {
    let anchor = Transform::from_translation(curve.point_at(joint))
        .with_rotation(Quaternion::from_rotation_arc(Vec3::X, curve.tangent_at(joint)));
    let group = graph.add_group(parent, "sensor", anchor)?;
    let rotor = graph.add_group(group, "sensor-rotor", Transform::IDENTITY)?;

    let housing_material = MaterialLayer::new([0.2, 0.22, 0.25])
        .with_surface(0.35, 0.8)
        .with_map(library.get(MapSlot::Metal), [2.0, 2.0]);
    let housing = graph.spawn_mesh(
        backend,
        rotor,
        "sensor-housing",
        &Geometry::hex_collar("sensor-housing", HOUSING_APOTHEM, HOUSING_BORE, HOUSING_LENGTH),
        vec![housing_material],
        Transform::IDENTITY,
    )?;

    let screen_quad = Geometry::quad("screen", SCREEN_SIZE.0, SCREEN_SIZE.1);
    let led_quad = Geometry::quad("led", LED_SIZE, LED_SIZE);
    let mut screens = [housing; SENSOR_FACES];
    let mut leds = [housing; SENSOR_FACES];

    for face in 0..SENSOR_FACES {
        let normal = hex_face_normal(face);
        let rotation = screen_rotation(face);

        let screen_material = MaterialLayer::new([1.0; 3])
            .with_surface(0.2, 0.0)
            .with_emissive([1.0; 3], 0.9)
            .with_map(screen_maps[face].as_ref(), [1.0, 1.0]);
        screens[face] = graph.spawn_mesh(
            backend,
            rotor,
            format!("screen-{face}"),
            &screen_quad,
            vec![screen_material],
            Transform::from_translation(normal * (HOUSING_APOTHEM + 0.004)).with_rotation(rotation),
        )?;

        let led_offset = Vec3::X * (SCREEN_SIZE.0 * 0.5 + LED_SIZE);
        let led_material = MaterialLayer::new(HEALTHY_LED).with_emissive(HEALTHY_LED, LED_OFF_INTENSITY);
        leds[face] = graph.spawn_mesh(
            backend,
            rotor,
            format!("led-{face}"),
            &led_quad,
            vec![led_material],
            Transform::from_translation(normal * (HOUSING_APOTHEM + 0.006) + led_offset).with_rotation(rotation),
        )?;
    }

    Ok(SensorModule {
        group,
        rotor,
        housing,
        screens,
        leds,
        orbit_angle: 0.0,
        leds_lit: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;

    #[test]
    fn test_screen_faces_outward() {
        for face in 0..SENSOR_FACES {
            let facing = screen_rotation(face).rotate(Vec3::Z);
            assert!(facing.distance(hex_face_normal(face)) < 1e-5, "face {face}");
        }
    }

    #[test]
    fn test_screens_share_handedness() {
        // Rows run along the cable on every face, and "up" turns the same
        // way around the ring, so no face is mirrored or upside down
        for face in 0..SENSOR_FACES {
            let rotation = screen_rotation(face);
            let right = rotation.rotate(Vec3::X);
            let up = rotation.rotate(Vec3::Y);
            let normal = hex_face_normal(face);
            assert!(right.distance(Vec3::X) < 1e-5);
            assert!(right.cross(up).dot(normal) > 0.999);
            let tangential = Vec3::X.cross(normal);
            assert!(up.dot(tangential) < -0.999, "face {face} up {up:?}");
        }
    }

    #[test]
    fn test_build_and_blink() {
        let mut backend = HeadlessBackend::new();
        let mut graph = SceneGraph::new();
        let curve = PathCurve::straight(6.0);
        let root = graph.root();
        let maps: [Option<SharedTexture>; SENSOR_FACES] = Default::default();
        let mut sensor = build_sensor(
            &mut graph,
            &mut backend,
            root,
            &curve,
            0.5,
            &TextureLibrary::empty(),
            &maps,
        )
        .unwrap();
        assert_eq!(graph.mesh_count(), 1 + 2 * SENSOR_FACES);

        assert!(sensor.blink(&mut graph, FaultMode::JointOverheat).unwrap());
        assert!(!sensor.blink(&mut graph, FaultMode::JointOverheat).unwrap());
        assert_eq!(graph.flush_materials(&mut backend).unwrap(), SENSOR_FACES as u32);

        sensor.advance_orbit(&mut graph, 0.5, 0.4, false).unwrap();
        assert_eq!(sensor.orbit_angle(), 0.0);
        sensor.advance_orbit(&mut graph, 0.5, 0.4, true).unwrap();
        assert!((sensor.orbit_angle() - 0.2).abs() < 1e-6);

        graph.dispose(&mut backend);
        assert_eq!(backend.live_counts().total(), 0);
    }
}
