use crate::device_display::interface::{empty_lines, write_into, DeviceDisplay, LineBuffer};
use crate::label::Label;
use eframe::egui;
use image::DynamicImage;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};
use std::thread;

const THUMBNAIL_SIZE: (u32, u32) = (96, 72);

#[derive(Default)]
struct Thumbnail {
    version: u64,
    image: Option<egui::ColorImage>,
}

struct Shared {
    display_buffer: LineBuffer,
    thumbnails: BTreeMap<Label, Thumbnail>,
}

struct DisplayWindow {
    shared: Arc<Mutex<Shared>>,
    textures: BTreeMap<Label, (u64, egui::TextureHandle)>,
}

impl eframe::App for DisplayWindow {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());

        for (label, thumbnail) in shared.thumbnails.iter() {
            let stale = self
                .textures
                .get(label)
                .map_or(true, |(version, _)| *version != thumbnail.version);
            if let (true, Some(image)) = (stale, &thumbnail.image) {
                let texture = ctx.load_texture(
                    label.name(),
                    image.clone(),
                    egui::TextureOptions::default(),
                );
                self.textures.insert(*label, (thumbnail.version, texture));
            }
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(12.0);

                egui::Frame::none()
                    .fill(egui::Color32::from_rgb(200, 255, 200))
                    .stroke(egui::Stroke::new(2.0, egui::Color32::from_rgb(100, 100, 100)))
                    .inner_margin(8.0)
                    .show(ui, |ui| {
                        for row in shared.display_buffer.iter() {
                            let text: String = row.iter().collect();
                            ui.label(
                                egui::RichText::new(text)
                                    .monospace()
                                    .color(egui::Color32::BLACK)
                                    .size(20.0),
                            );
                        }
                    });

                ui.add_space(12.0);

                ui.horizontal(|ui| {
                    for label in Label::ALL {
                        ui.vertical(|ui| {
                            let size = egui::vec2(THUMBNAIL_SIZE.0 as f32, THUMBNAIL_SIZE.1 as f32);
                            match self.textures.get(&label) {
                                Some((_, texture)) => {
                                    ui.image(egui::load::SizedTexture::new(texture.id(), size));
                                }
                                None => {
                                    let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
                                    ui.painter().rect_filled(rect, 0.0, egui::Color32::from_gray(40));
                                }
                            }
                            ui.label(label.name());
                        });
                    }
                });
            });
        });

        ctx.request_repaint_after(std::time::Duration::from_millis(50));
    }
}

pub struct DeviceDisplayGui {
    shared: Arc<Mutex<Shared>>,
}

impl DeviceDisplayGui {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                display_buffer: empty_lines(),
                thumbnails: BTreeMap::new(),
            })),
        }
    }

    fn with_shared<T>(&self, f: impl FnOnce(&mut Shared) -> T) -> T {
        let mut shared = self.shared.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut shared)
    }
}

impl DeviceDisplay for DeviceDisplayGui {
    fn init(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let shared = self.shared.clone();

        thread::spawn(move || {
            let options = eframe::NativeOptions {
                viewport: egui::ViewportBuilder::default()
                    .with_inner_size([480.0, 260.0])
                    .with_resizable(false),
                ..Default::default()
            };

            let window = DisplayWindow {
                shared,
                textures: BTreeMap::new(),
            };

            // Blocks this thread until the window is closed
            let _ = eframe::run_native(
                "Gesture Trainer",
                options,
                Box::new(|_cc| Box::new(window)),
            );
        });

        Ok(())
    }

    fn clear(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.with_shared(|shared| shared.display_buffer = empty_lines());
        Ok(())
    }

    fn write_line(&mut self, line: u8, text: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.with_shared(|shared| write_into(&mut shared.display_buffer, line, text))
    }

    fn draw_frame(&mut self, label: Label, frame: &DynamicImage) -> Result<(), Box<dyn Error + Send + Sync>> {
        let rgb = frame
            .thumbnail(THUMBNAIL_SIZE.0, THUMBNAIL_SIZE.1)
            .to_rgb8();
        let image = egui::ColorImage::from_rgb(
            [rgb.width() as usize, rgb.height() as usize],
            rgb.as_raw(),
        );

        self.with_shared(|shared| {
            let thumbnail = shared.thumbnails.entry(label).or_default();
            thumbnail.version += 1;
            thumbnail.image = Some(image);
        });
        Ok(())
    }
}
