use std::fmt;

/// GPU initialisation failures.
#[derive(Debug)]
pub enum RenderContextError {
    /// The window handle could not back a surface.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No adapter matched the request.
    AdapterRequest(wgpu::RequestAdapterError),
    /// The adapter refused the device request.
    DeviceRequest(wgpu::RequestDeviceError),
    /// The adapter cannot present to the surface.
    UnsupportedSurface,
}

impl fmt::Display for RenderContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SurfaceCreation(e) => write!(f, "cannot create surface: {e}"),
            Self::AdapterRequest(e) => write!(f, "no GPU adapter: {e}"),
            Self::DeviceRequest(e) => write!(f, "cannot open device: {e}"),
            Self::UnsupportedSurface => f.write_str("adapter cannot present to surface"),
        }
    }
}

impl std::error::Error for RenderContextError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SurfaceCreation(e) => Some(e),
            Self::AdapterRequest(e) => Some(e),
            Self::DeviceRequest(e) => Some(e),
            Self::UnsupportedSurface => None,
        }
    }
}

/// Device, queue and colour target description shared by every GPU-side
/// component.
pub struct RenderContext {
    /// Logical device.
    pub device: wgpu::Device,
    /// Submission queue.
    pub queue: wgpu::Queue,
    /// Presentation surface, `None` for offscreen rendering.
    pub surface: Option<wgpu::Surface<'static>>,
    /// Colour target format and size. Only configures a surface when one
    /// exists.
    pub config: wgpu::SurfaceConfiguration,
    /// Outline passes can rasterise lines.
    pub line_polygons: bool,
}

/// Adapter plus the device opened on it.
struct Opened {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    line_polygons: bool,
}

async fn open(
    instance: &wgpu::Instance,
    surface: Option<&wgpu::Surface<'static>>,
) -> Result<Opened, RenderContextError> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            compatible_surface: surface,
            power_preference: wgpu::PowerPreference::HighPerformance,
            ..Default::default()
        })
        .await
        .map_err(RenderContextError::AdapterRequest)?;
    let info = adapter.get_info();
    log::info!("GPU adapter: {} ({:?})", info.name, info.backend);

    // line rasterisation is optional; outlines fall back to fill without it
    let features = adapter.features() & wgpu::Features::POLYGON_MODE_LINE;
    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("Molpass Device"),
            required_features: features,
            required_limits: wgpu::Limits::default(),
            ..Default::default()
        })
        .await
        .map_err(RenderContextError::DeviceRequest)?;
    Ok(Opened {
        adapter,
        device,
        queue,
        line_polygons: features.contains(wgpu::Features::POLYGON_MODE_LINE),
    })
}

fn offscreen_config(format: wgpu::TextureFormat, (width, height): (u32, u32)) -> wgpu::SurfaceConfiguration {
    wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width,
        height,
        present_mode: wgpu::PresentMode::Fifo,
        desired_maximum_frame_latency: 2,
        alpha_mode: wgpu::CompositeAlphaMode::Auto,
        view_formats: vec![],
    }
}

impl RenderContext {
    /// Open a device able to present to `window`.
    ///
    /// # Errors
    ///
    /// Any [`RenderContextError`].
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        size: (u32, u32),
    ) -> Result<Self, RenderContextError> {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
            .map_err(RenderContextError::SurfaceCreation)?;
        let opened = open(&instance, Some(&surface)).await?;

        let mut config = surface
            .get_default_config(&opened.adapter, size.0, size.1)
            .ok_or(RenderContextError::UnsupportedSurface)?;
        config.present_mode = wgpu::PresentMode::Fifo;
        surface.configure(&opened.device, &config);

        Ok(Self {
            device: opened.device,
            queue: opened.queue,
            surface: Some(surface),
            config,
            line_polygons: opened.line_polygons,
        })
    }

    /// Open a device for offscreen targets of `format` and `size`.
    ///
    /// # Errors
    ///
    /// [`RenderContextError::AdapterRequest`] or
    /// [`RenderContextError::DeviceRequest`].
    pub async fn headless(
        format: wgpu::TextureFormat,
        size: (u32, u32),
    ) -> Result<Self, RenderContextError> {
        let opened = open(&wgpu::Instance::default(), None).await?;
        Ok(Self {
            device: opened.device,
            queue: opened.queue,
            surface: None,
            config: offscreen_config(format, size),
            line_polygons: opened.line_polygons,
        })
    }

    /// Wrap a device the host already owns.
    #[must_use]
    pub fn from_device(
        device: wgpu::Device,
        queue: wgpu::Queue,
        format: wgpu::TextureFormat,
        size: (u32, u32),
    ) -> Self {
        let line_polygons = device.features().contains(wgpu::Features::POLYGON_MODE_LINE);
        Self {
            device,
            queue,
            surface: None,
            config: offscreen_config(format, size),
            line_polygons,
        }
    }

    /// Colour target format.
    #[must_use]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Colour target size.
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Track a new target size, reconfiguring the surface if there is one.
    /// Zero-sized requests are ignored.
    pub fn resize(&mut self, (width, height): (u32, u32)) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        if let Some(surface) = &self.surface {
            surface.configure(&self.device, &self.config);
        }
    }

    /// Fresh command encoder.
    #[must_use]
    pub fn create_encoder(&self) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Molpass Encoder"),
            })
    }

    /// Finish `encoder` and submit it.
    pub fn submit(&self, encoder: wgpu::CommandEncoder) {
        let _ = self.queue.submit(std::iter::once(encoder.finish()));
    }
}
