// src/wgpu_utils/uniform_buffer.rs - Dynamic-offset uniform arena

/// Rounds `size` up to the next multiple of `alignment`
pub fn align_to(size: u64, alignment: u64) -> u64 {
    debug_assert!(alignment.is_power_of_two());
    (size + alignment - 1) & !(alignment - 1)
}

/// CPU side of the arena: uniform snapshots packed at aligned offsets
#[derive(Debug)]
pub struct UniformStaging {
    data: Vec<u8>,
    alignment: u64,
}

impl UniformStaging {
    pub fn new(alignment: u64) -> Self {
        Self {
            data: Vec::new(),
            alignment,
        }
    }

    /// Appends one snapshot and returns its byte offset
    pub fn push(&mut self, bytes: &[u8]) -> u32 {
        let offset = self.data.len();
        let slot = align_to(bytes.len().max(1) as u64, self.alignment) as usize;
        self.data.extend_from_slice(bytes);
        self.data.resize(offset + slot, 0);
        offset as u32
    }

    /// Bytes one snapshot of `size` bytes occupies
    pub fn slot_size(&self, size: u64) -> u64 {
        align_to(size.max(1), self.alignment)
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Uniform buffer holding one snapshot per draw, addressed by dynamic offset
///
/// Usage per pass: [`reserve`](Self::reserve) the bytes the pass needs,
/// [`push`](Self::push) one snapshot per draw, then [`flush`](Self::flush)
/// before the recorded commands are submitted. Growing the buffer bumps the
/// generation, which invalidates bind groups created over the old buffer.
pub struct DynamicUniformBuffer {
    buffer: wgpu::Buffer,
    staging: UniformStaging,
    generation: u64,
    label: String,
}

impl DynamicUniformBuffer {
    const INITIAL_SIZE: u64 = 64 * 1024;

    pub fn new(device: &wgpu::Device, label: &str) -> Self {
        let alignment = device.limits().min_uniform_buffer_offset_alignment as u64;
        Self {
            buffer: Self::create_buffer(device, label, Self::INITIAL_SIZE),
            staging: UniformStaging::new(alignment),
            generation: 0,
            label: label.to_owned(),
        }
    }

    fn create_buffer(device: &wgpu::Device, label: &str, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("DynamicUniformBuffer: {}", label)),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Starts a pass: drops previous snapshots and makes room for `required` bytes
    pub fn reserve(&mut self, device: &wgpu::Device, required: u64) {
        self.staging.clear();
        if required <= self.buffer.size() {
            return;
        }

        let size = required.next_power_of_two().max(Self::INITIAL_SIZE);
        log::debug!(
            "Growing uniform arena '{}' from {} to {} bytes",
            self.label,
            self.buffer.size(),
            size
        );
        self.buffer = Self::create_buffer(device, &self.label, size);
        self.generation += 1;
    }

    /// Bytes a snapshot of `size` bytes occupies in the arena
    pub fn slot_size(&self, size: u64) -> u64 {
        self.staging.slot_size(size)
    }

    /// Stores a snapshot and returns the dynamic offset to bind it at
    pub fn push(&mut self, bytes: &[u8]) -> u32 {
        self.staging.push(bytes)
    }

    /// Uploads every snapshot pushed since the last reserve
    pub fn flush(&self, queue: &wgpu::Queue) {
        if !self.staging.is_empty() {
            queue.write_buffer(&self.buffer, 0, self.staging.bytes());
        }
    }

    /// Get the underlying buffer
    pub fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
