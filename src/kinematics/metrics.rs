use nalgebra::{Point2, Point3};

use crate::pose::Landmark;

/// 2点間のユークリッド距離
pub fn distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    (b - a).norm()
}

/// ランドマーク間の移動速度（units/s）。dt=0なら0。
pub fn speed_between(previous: &Landmark, current: &Landmark, dt: f64) -> f64 {
    if dt <= 0.0 {
        return 0.0;
    }
    distance(&previous.point(), &current.point()) / dt
}

/// 速度変化から加速度を求める。dt=0なら0。
pub fn acceleration(current_speed: f64, previous_speed: f64, dt: f64) -> f64 {
    if dt <= 0.0 {
        return 0.0;
    }
    (current_speed - previous_speed) / dt
}

/// 関節角度（度）。`vertex` を頂点として `end_a`・`end_b` へのベクトルが成す角。
/// 浮動小数の誤差でacosの定義域を外れないようcosをクランプする。
/// どちらかのベクトルが零なら0度。
pub fn joint_angle_deg(end_a: Point2<f64>, vertex: Point2<f64>, end_b: Point2<f64>) -> f64 {
    let v1 = end_a - vertex;
    let v2 = end_b - vertex;
    let n1 = v1.norm();
    let n2 = v2.norm();
    if n1 == 0.0 || n2 == 0.0 {
        return 0.0;
    }
    let cos = (v1.dot(&v2) / (n1 * n2)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_speed_zero_dt_is_zero() {
        let a = Landmark::new(0.0, 0.0, 0.0);
        let b = Landmark::new(3.0, 4.0, 0.0);
        let s = speed_between(&a, &b, 0.0);
        assert_eq!(s, 0.0);
        assert!(s.is_finite());
    }

    #[test]
    fn test_acceleration_zero_dt_is_zero() {
        let a = acceleration(5.0, 1.0, 0.0);
        assert_eq!(a, 0.0);
        assert!(a.is_finite());
    }

    #[test]
    fn test_identical_points_zero_distance_and_speed() {
        let a = Landmark::new(0.3, 0.7, -0.1);
        assert_eq!(distance(&a.point(), &a.point()), 0.0);
        assert_eq!(speed_between(&a, &a, 0.5), 0.0);
    }

    #[test]
    fn test_three_four_five_scenario() {
        // snapshot A leftWrist (0,0,0) at t=0, snapshot B (3,4,0) at t=1
        let a = Landmark::new(0.0, 0.0, 0.0);
        let b = Landmark::new(3.0, 4.0, 0.0);
        assert!((distance(&a.point(), &b.point()) - 5.0).abs() < EPS);
        assert!((speed_between(&a, &b, 1.0) - 5.0).abs() < EPS);
    }

    #[test]
    fn test_straight_arm_is_180_degrees() {
        // shoulder - elbow - wrist collinear, elbow in the middle
        let angle = joint_angle_deg(
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(2.0, 2.0),
        );
        assert!((angle - 180.0).abs() < 1e-6, "angle = {angle}");
    }

    #[test]
    fn test_right_angle_is_90_degrees() {
        let angle = joint_angle_deg(
            Point2::new(0.0, 1.0),
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
        );
        assert!((angle - 90.0).abs() < 1e-6, "angle = {angle}");
    }

    #[test]
    fn test_degenerate_limb_is_zero() {
        let p = Point2::new(0.5, 0.5);
        assert_eq!(joint_angle_deg(p, p, Point2::new(1.0, 0.0)), 0.0);
    }

    #[test]
    fn test_angle_clamps_fp_overshoot() {
        // Nearly collinear points can push |cos| over 1.0 without the clamp
        let angle = joint_angle_deg(
            Point2::new(1e-8, 1.0),
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 2.0),
        );
        assert!(angle.is_finite());
        assert!(angle.abs() < 1.0);
    }
}
