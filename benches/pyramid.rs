use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{GrayImage, Luma, Rgb, RgbImage};
use seamblend::{
    build_gaussian_pyramid, build_laplacian_pyramid, to_normalized, ColorPlane, Device,
    MultibandBlender,
};

fn test_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 251) as u8, (y % 241) as u8, ((x + y) % 239) as u8])
    })
}

fn bench_laplacian_pyramid(c: &mut Criterion) {
    let device = Device::detect().expect("device");
    let plane: ColorPlane = to_normalized(&test_image(1280, 1024)).expect("plane");

    c.bench_function("laplacian_pyramid_rgb_5_levels_1280x1024", |b| {
        b.iter(|| {
            let gaussian = build_gaussian_pyramid(&device, plane.clone(), 5).expect("gaussian");
            let laplacian = build_laplacian_pyramid(&device, black_box(&gaussian)).expect("laplacian");
            black_box(laplacian.len());
        });
    });
}

fn bench_blend(c: &mut Criterion) {
    let device = Device::detect().expect("device");
    let blender = MultibandBlender::new(device, 5).expect("blender");
    let (left, right) = (test_image(640, 480), test_image(640, 480));
    let mask = GrayImage::from_fn(640, 480, |x, _| Luma([if x < 320 { 255 } else { 0 }]));

    c.bench_function("multiband_blend_5_levels_640x480", |b| {
        b.iter(|| {
            let out = blender
                .blend(black_box(&left), black_box(&right), black_box(&mask))
                .expect("blend");
            black_box(out);
        });
    });
}

criterion_group!(benches, bench_laplacian_pyramid, bench_blend);
criterion_main!(benches);
