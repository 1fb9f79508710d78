mod common;

use common::{Op, RecordingSurface};
use tradecall_viz::config::WaveformStyle;
use tradecall_viz::placeholder;
use tradecall_viz::playback::{AudioPipeline, FrequencySnapshot, OfflineOutput, PlayOutcome};
use tradecall_viz::waveform::{source_index, WaveformRenderer};

#[test]
fn bar_indices_stay_in_lower_half() {
    let bars = 40;
    for bins in [32, 33, 64, 128, 256, 1024, 2048, 16_384] {
        for i in 0..bars {
            let index = source_index(i, bars, bins);
            assert!((index as f64) < bins as f64 / 2.0, "bar {i} of {bins} bins -> {index}");
        }
    }
}

#[test]
fn idle_frame_draws_flat_muted_bars() {
    let style = WaveformStyle::default();
    let mut renderer = WaveformRenderer::new(style.clone());
    let mut pipeline = AudioPipeline::new(OfflineOutput::default());
    let mut surface = RecordingSurface::new(400.0, 64.0);

    renderer.frame(&mut pipeline, &mut surface);

    assert_eq!(surface.ops[0], Op::Clear);
    let rects = surface.rects();
    assert_eq!(rects.len(), 40);
    for (i, (rect, color)) in rects.iter().enumerate() {
        assert_eq!(*color, style.idle_color);
        assert_eq!(rect.height, style.idle_bar_height);
        assert_eq!(rect.x, i as f64 * 10.0);
        assert_eq!(rect.width, 8.0);
        assert_eq!(rect.y, (64.0 - 10.0) / 2.0);
    }
    assert_eq!(renderer.readout(), "00:00 / 00:00");
}

#[test]
fn playing_frame_follows_frequencies() {
    let style = WaveformStyle::default();
    let mut renderer = WaveformRenderer::new(style.clone());
    let mut pipeline = AudioPipeline::new(OfflineOutput::default());
    let PlayOutcome::Loading(ticket) = pipeline.request_play() else {
        panic!("expected a load");
    };
    pipeline.complete_synthesis(ticket, Ok(placeholder::sample_call(10.0)));
    pipeline.output_mut().advance(0.6);

    let mut surface = RecordingSurface::new(400.0, 64.0);
    renderer.frame(&mut pipeline, &mut surface);

    let rects = surface.rects();
    assert_eq!(rects.len(), 40);
    assert!(rects.iter().all(|(_, color)| *color == style.active_color));
    assert!(rects
        .iter()
        .all(|(r, _)| r.height >= style.min_bar_height && r.height <= 64.0 * 0.8));
    assert!(rects.iter().any(|(r, _)| r.height > style.min_bar_height));
    assert_eq!(renderer.readout(), "00:00 / 00:10");

    pipeline.output_mut().advance(3.0);
    renderer.frame(&mut pipeline, &mut surface);
    assert_eq!(renderer.readout(), "00:03 / 00:10");
    assert!((renderer.time_code().elapsed - 3.6).abs() < 1e-9);
}

#[test]
fn heights_follow_mapped_bins() {
    let style = WaveformStyle {
        bars: 4,
        gap: 0.0,
        ..WaveformStyle::default()
    };
    let mut renderer = WaveformRenderer::new(style);
    // 16 bins, lower half mapped: bars read bins 0, 2, 4, 6
    let mut bins = vec![0u8; 16];
    bins[0] = 255;
    bins[2] = 0;
    bins[4] = 51;
    bins[6] = 255;
    let snapshot = FrequencySnapshot::new(bins);
    let mut surface = RecordingSurface::new(100.0, 100.0);

    renderer.draw(&mut surface, Some(&snapshot));

    let heights: Vec<f64> = renderer.bars().iter().map(|b| b.height).collect();
    for (got, want) in heights.iter().zip([80.0, 4.0, 16.0, 80.0]) {
        assert!((got - want).abs() < 1e-9, "{heights:?}");
    }
    assert_eq!(renderer.bars()[1].y, 48.0);
}

#[test]
fn zero_sized_surface_draws_nothing() {
    let mut renderer = WaveformRenderer::new(WaveformStyle::default());
    let mut surface = RecordingSurface::new(0.0, 64.0);
    renderer.draw(&mut surface, None);
    assert_eq!(surface.ops, vec![Op::Clear]);
}
