use doodle_shared::{
    normalize, Brush, FrameNormalizer, NormalizerConfig, Point, RasterSurface, Rgb, StrokeRecorder, Surface,
};
use proptest::prelude::*;

fn recorder(size: u32) -> StrokeRecorder<RasterSurface> {
    StrokeRecorder::new(RasterSurface::new(size, size, Rgb::WHITE), Brush::default(), Rgb::WHITE)
}

fn draw(recorder: &mut StrokeRecorder<RasterSurface>, points: &[(f32, f32)]) {
    let mut iter = points.iter().map(|&(x, y)| Point::new(x, y));
    if let Some(first) = iter.next() {
        recorder.begin_stroke(first);
    }
    for point in iter {
        recorder.extend_stroke(point);
    }
    recorder.end_stroke();
}

fn stroke_strategy() -> impl Strategy<Value = Vec<(f32, f32)>> {
    prop::collection::vec((-8.0f32..72.0, -8.0f32..72.0), 1..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn undo_restores_the_prior_surface(
        history in prop::collection::vec(stroke_strategy(), 0..4),
        extra in stroke_strategy(),
    ) {
        let mut recorder = recorder(64);
        for stroke in &history {
            draw(&mut recorder, stroke);
        }
        let before = recorder.surface().read_pixels();
        draw(&mut recorder, &extra);
        recorder.undo();
        prop_assert_eq!(recorder.strokes().len(), history.len());
        prop_assert!(recorder.surface().read_pixels() == before);
    }

    #[test]
    fn identical_recordings_normalize_identically(
        history in prop::collection::vec(stroke_strategy(), 1..4),
        invert in any::<bool>(),
    ) {
        let mut first = recorder(64);
        let mut second = recorder(64);
        for stroke in &history {
            draw(&mut first, stroke);
            draw(&mut second, stroke);
        }
        let normalizer = FrameNormalizer::new(NormalizerConfig { target_size: 28, invert_colors: invert, smoothing: false });
        let a = normalizer.normalize_surface(first.surface());
        let b = normalizer.normalize_surface(second.surface());
        prop_assert_eq!(a.values(), b.values());
        let again = normalizer.normalize_surface(first.surface());
        prop_assert_eq!(a.values(), again.values());
    }

    #[test]
    fn inverted_is_the_complement(history in prop::collection::vec(stroke_strategy(), 1..4), size in 1u32..40) {
        let mut recorder = recorder(64);
        for stroke in &history {
            draw(&mut recorder, stroke);
        }
        let pixels = recorder.surface().read_pixels();
        let plain = normalize(&pixels, size, false);
        let inverted = normalize(&pixels, size, true);
        for (p, i) in plain.values().iter().zip(inverted.values()) {
            prop_assert!((0.0..=1.0).contains(p));
            prop_assert_eq!(*i, 1.0 - *p);
        }
    }
}

#[test]
fn is_empty_flips_on_first_commit() {
    let mut recorder = recorder(64);
    assert!(recorder.is_empty());
    recorder.begin_stroke(Point::new(1.0, 1.0));
    recorder.extend_stroke(Point::new(9.0, 9.0));
    assert!(recorder.is_empty());
    recorder.end_stroke();
    assert!(!recorder.is_empty());
}

#[test]
fn short_diagonal_darkens_the_corner_cells() {
    let mut recorder = recorder(400);
    draw(&mut recorder, &[(0.0, 0.0), (27.0, 27.0)]);
    let frame = normalize(&recorder.surface().read_pixels(), 28, false);
    assert_eq!(frame.values().len(), 28 * 28);

    let corner = frame.get(0, 0).unwrap();
    let next = frame.get(1, 1).unwrap();
    assert!(corner < 0.6, "corner {corner}");
    assert!(next < 0.7, "next {next}");
    assert!(corner < frame.get(0, 2).unwrap());
    for row in 0..28 {
        for col in 0..28 {
            if row >= 3 || col >= 3 {
                let value = frame.get(row, col).unwrap();
                assert!(value > 0.999, "cell ({row}, {col}) = {value}");
            }
        }
    }
}

#[test]
fn full_diagonal_is_dark_along_the_diagonal() {
    let mut recorder = recorder(400);
    draw(&mut recorder, &[(0.0, 0.0), (200.0, 200.0), (399.0, 399.0)]);
    let frame = normalize(&recorder.surface().read_pixels(), 28, false);
    for i in 0..28 {
        let on = frame.get(i, i).unwrap();
        assert!(on < 0.5, "diagonal cell {i} = {on}");
        if i + 3 < 28 {
            let off = frame.get(i, i + 3).unwrap();
            assert!(off > 0.999, "off-diagonal cell {i} = {off}");
        }
    }
}

#[test]
fn cleared_canvas_normalizes_uniformly() {
    let mut recorder = recorder(400);
    draw(&mut recorder, &[(30.0, 30.0), (300.0, 120.0), (80.0, 350.0)]);
    recorder.clear();
    assert!(recorder.is_empty());
    let frame = normalize(&recorder.surface().read_pixels(), 28, false);
    let first = frame.values()[0];
    assert_eq!(first, 1.0);
    assert!(frame.values().iter().all(|&v| v == first));
}

#[test]
fn two_undos_of_three_render_only_the_first() {
    let first = [(40.0, 40.0), (120.0, 60.0), (200.0, 40.0)];
    let mut recorder = recorder(256);
    draw(&mut recorder, &first);
    draw(&mut recorder, &[(20.0, 200.0), (220.0, 210.0)]);
    draw(&mut recorder, &[(128.0, 100.0), (128.0, 250.0)]);
    recorder.undo();
    recorder.undo();
    assert!(!recorder.is_empty());

    let mut reference = self::recorder(256);
    draw(&mut reference, &first);
    assert!(recorder.surface().read_pixels() == reference.surface().read_pixels());
}
