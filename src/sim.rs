//! Test doubles: a simulated register file and in-memory collaborators

use crate::firmware::{
    Board, Cell, DeviceTree, Interpreter, MemoryManager, NodePath, Phandle, PhysMemory, PropValue,
    PATH_MAX,
};
use crate::hal::mmio::RegisterBus;
use crate::hal::timer::Delay;
use crate::words::Word;
use std::cell::{Cell as StdCell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

#[derive(Default)]
struct BusState {
    regs: BTreeMap<u32, u32>,
    reads: BTreeMap<u32, usize>,
    writes: Vec<(u32, u32)>,
    queued: BTreeMap<u32, VecDeque<u32>>,
    // addr -> (mask, reads before the bits drop, armed countdown)
    self_clearing: BTreeMap<u32, (u32, usize, Option<usize>)>,
}

/// Register file with read counters, scripted reads and self-clearing bits
#[derive(Default)]
pub struct SimBus {
    state: RefCell<BusState>,
}

impl SimBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset a register without recording a write
    pub fn set(&self, addr: u32, value: u32) {
        self.state.borrow_mut().regs.insert(addr, value);
    }

    /// Stored value, without counting a read
    pub fn get(&self, addr: u32) -> u32 {
        self.state.borrow().regs.get(&addr).copied().unwrap_or(0)
    }

    /// Serve `values` for the next reads of `addr` before the stored value
    pub fn queue_reads(&self, addr: u32, values: &[u32]) {
        self.state
            .borrow_mut()
            .queued
            .entry(addr)
            .or_default()
            .extend(values.iter().copied());
    }

    /// Bits in `mask` written as 1 read back set `reads` more times, then drop
    pub fn self_clear(&self, addr: u32, mask: u32, reads: usize) {
        self.state
            .borrow_mut()
            .self_clearing
            .insert(addr, (mask, reads, None));
    }

    pub fn reads_of(&self, addr: u32) -> usize {
        self.state.borrow().reads.get(&addr).copied().unwrap_or(0)
    }

    pub fn writes(&self) -> Vec<(u32, u32)> {
        self.state.borrow().writes.clone()
    }
}

impl RegisterBus for SimBus {
    fn read32(&self, addr: u32) -> u32 {
        let mut state = self.state.borrow_mut();
        *state.reads.entry(addr).or_default() += 1;

        if let Some(value) = state.queued.get_mut(&addr).and_then(VecDeque::pop_front) {
            return value;
        }

        let mut clear = 0;
        if let Some((mask, _, armed)) = state.self_clearing.get_mut(&addr) {
            match armed {
                Some(0) => {
                    clear = *mask;
                    *armed = None;
                }
                Some(remaining) => *remaining -= 1,
                None => {}
            }
        }
        let value = state.regs.entry(addr).or_default();
        *value &= !clear;
        *value
    }

    fn write32(&self, addr: u32, value: u32) {
        let mut state = self.state.borrow_mut();
        state.writes.push((addr, value));
        state.regs.insert(addr, value);
        if let Some((mask, reads, armed)) = state.self_clearing.get_mut(&addr) {
            if value & *mask != 0 {
                *armed = Some(*reads);
            }
        }
    }
}

/// Delay that returns at once
pub struct NoDelay;

impl Delay for NoDelay {
    fn delay_ms(&self, _ms: u32) {}
}

/// Delay that only counts
#[derive(Default)]
pub struct RecordingDelay {
    calls: StdCell<u32>,
    total_ms: StdCell<u32>,
}

impl RecordingDelay {
    pub fn calls(&self) -> u32 {
        self.calls.get()
    }

    pub fn total_ms(&self) -> u32 {
        self.total_ms.get()
    }
}

impl Delay for RecordingDelay {
    fn delay_ms(&self, ms: u32) {
        self.calls.set(self.calls.get() + 1);
        self.total_ms.set(self.total_ms.get() + ms);
    }
}

/// Stored property value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prop {
    Int(u32),
    Str(String),
    Reg(u32, u32),
}

struct Node {
    name: String,
    parent: Option<usize>,
    device_type: Option<String>,
    props: Vec<(String, Prop)>,
    finished: bool,
    removed: bool,
}

const STRING_BASE: Cell = 0x1000;

/// In-memory Forth environment and device tree
pub struct FakeOf {
    nodes: Vec<Node>,
    current: Option<usize>,
    strings: Vec<String>,
    pub stack: Vec<Cell>,
    pub words: Vec<String>,
    pub evals: Vec<String>,
    pub bindings: Vec<(String, Word)>,
    pub env: BTreeMap<String, String>,
    pub aliases: BTreeMap<String, String>,
    pub node_methods: Vec<String>,
    pub boot_device: Option<String>,
    pub load_base: Cell,
}

impl FakeOf {
    /// Root only
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                name: String::new(),
                parent: None,
                device_type: None,
                props: Vec::new(),
                finished: true,
                removed: false,
            }],
            current: None,
            strings: Vec::new(),
            stack: Vec::new(),
            words: Vec::new(),
            evals: Vec::new(),
            bindings: Vec::new(),
            env: BTreeMap::new(),
            aliases: BTreeMap::new(),
            node_methods: Vec::new(),
            boot_device: None,
            load_base: 0x0400_0000,
        }
    }

    /// The tree the platform fixups leave behind
    pub fn standard() -> Self {
        let mut of = Self::new();
        for path in ["/cpus", "/memory", "/options", "/chosen", "/video", "/gx2"] {
            of.add_node(path);
        }
        for (path, reg) in [
            ("/usb@0d050000", 0x0D05_0000),
            ("/usb@0d060000", 0x0D06_0000),
            ("/usb@0d130000", 0x0D13_0000),
            ("/usb@0d150000", 0x0D15_0000),
            ("/sdhc", 0x0D07_0000),
        ] {
            let node = of.add_node(path);
            of.nodes[node.0 as usize]
                .props
                .push(("reg".into(), Prop::Int(reg)));
        }
        of
    }

    /// Create every missing component of `path`
    pub fn add_node(&mut self, path: &str) -> Phandle {
        let mut parent = 0;
        for component in path.split('/').filter(|c| !c.is_empty()) {
            parent = match self.child(parent, component) {
                Some(child) => child,
                None => {
                    self.nodes.push(Node {
                        name: component.into(),
                        parent: Some(parent),
                        device_type: None,
                        props: Vec::new(),
                        finished: true,
                        removed: false,
                    });
                    self.nodes.len() - 1
                }
            };
        }
        Phandle(parent as u32)
    }

    pub fn remove_node(&mut self, path: &str) {
        if let Some(node) = self.lookup(path) {
            self.nodes[node].removed = true;
        }
    }

    pub fn prop(&self, node: Phandle, name: &str) -> Option<&Prop> {
        self.nodes[node.0 as usize]
            .props
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p)
    }

    pub fn property_names(&self, node: Phandle) -> Vec<&str> {
        self.nodes[node.0 as usize]
            .props
            .iter()
            .map(|(n, _)| n.as_str())
            .collect()
    }

    pub fn device_type_of(&self, node: Phandle) -> Option<&str> {
        self.nodes[node.0 as usize].device_type.as_deref()
    }

    pub fn is_finished(&self, node: Phandle) -> bool {
        self.nodes[node.0 as usize].finished
    }

    pub fn current_path(&self) -> Option<String> {
        self.current.map(|node| self.full_path(node))
    }

    fn child(&self, parent: usize, name: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| !n.removed && n.parent == Some(parent) && n.name == name)
    }

    fn lookup(&self, path: &str) -> Option<usize> {
        let mut node = 0;
        for component in path.split('/').filter(|c| !c.is_empty()) {
            node = self.child(node, component)?;
        }
        Some(node)
    }

    fn full_path(&self, node: usize) -> String {
        match self.nodes[node].parent {
            None => "/".into(),
            Some(0) => format!("/{}", self.nodes[node].name),
            Some(parent) => format!("{}/{}", self.full_path(parent), self.nodes[node].name),
        }
    }

    fn current_node(&mut self) -> &mut Node {
        let current = self.current.expect("property write with no current node");
        &mut self.nodes[current]
    }
}

impl DeviceTree for FakeOf {
    fn find_device(&mut self, path: &str) -> Option<Phandle> {
        let node = self.lookup(path)?;
        self.current = Some(node);
        Some(Phandle(node as u32))
    }

    fn new_device(&mut self) {
        let parent = self.current.expect("new-device with no current node");
        self.nodes.push(Node {
            name: String::new(),
            parent: Some(parent),
            device_type: None,
            props: Vec::new(),
            finished: false,
            removed: false,
        });
        self.current = Some(self.nodes.len() - 1);
    }

    fn device_name(&mut self, name: &str) {
        self.current_node().name = name.into();
    }

    fn device_type(&mut self, ty: &str) {
        self.current_node().device_type = Some(ty.into());
    }

    fn property(&mut self, name: &str, value: PropValue<'_>) {
        let prop = match value {
            PropValue::Int(v) => Prop::Int(v),
            PropValue::Str(s) => Prop::Str(s.into()),
            PropValue::Reg { phys, size } => Prop::Reg(phys, size),
        };
        let node = self.current_node();
        match node.props.iter().position(|(n, _)| n == name) {
            Some(i) => node.props[i].1 = prop,
            None => node.props.push((name.into(), prop)),
        }
    }

    fn finish_device(&mut self) {
        let node = self.current_node();
        node.finished = true;
        let parent = node.parent;
        self.current = parent;
    }

    fn device_end(&mut self) {
        self.current = None;
    }

    fn find_dev(&self, path: &str) -> Option<Phandle> {
        self.lookup(path).map(|node| Phandle(node as u32))
    }

    fn int_property(&self, node: Phandle, name: &str) -> Option<u32> {
        match self.prop(node, name)? {
            Prop::Int(v) => Some(*v),
            Prop::Reg(phys, _) => Some(*phys),
            Prop::Str(_) => None,
        }
    }

    fn path_of(&self, node: Phandle) -> Option<NodePath> {
        let path = self.full_path(node.0 as usize);
        NodePath::try_from(path.as_str()).ok()
    }

    fn init_node_methods(&mut self, path: &str) {
        self.node_methods.push(path.into());
    }
}

impl Interpreter for FakeOf {
    fn push(&mut self, value: Cell) {
        self.stack.push(value);
    }

    fn pop(&mut self) -> Cell {
        self.stack.pop().expect("data stack underflow")
    }

    fn push_str(&mut self, s: &str) {
        self.strings.push(s.into());
        self.stack.push(STRING_BASE + self.strings.len() as Cell - 1);
        self.stack.push(s.len() as Cell);
    }

    fn pop_string(&mut self) -> Option<heapless::String<PATH_MAX>> {
        let _len = self.pop();
        let addr = self.pop();
        if addr == 0 {
            return None;
        }
        let s = &self.strings[(addr - STRING_BASE) as usize];
        heapless::String::try_from(s.as_str()).ok()
    }

    fn fword(&mut self, word: &str) {
        self.words.push(word.into());
        match word {
            "boot-device" => match self.boot_device.clone() {
                Some(dev) => self.push_str(&dev),
                None => {
                    self.push(0);
                    self.push(0);
                }
            },
            "pathres-resolve-aliases" => {
                let name = self.pop_string().expect("null alias");
                let resolved = self
                    .aliases
                    .get(name.as_str())
                    .cloned()
                    .unwrap_or_else(|| name.as_str().into());
                self.push_str(&resolved);
            }
            "$setenv" => {
                let name = self.pop_string().expect("null variable name");
                let value = self.pop_string().expect("null variable value");
                self.env.insert(name.as_str().into(), value.as_str().into());
            }
            "load-base" => {
                let base = self.load_base;
                self.push(base);
            }
            _ => {}
        }
    }

    fn feval(&mut self, source: &str) {
        self.evals.push(source.into());
    }

    fn bind(&mut self, name: &str, word: Word) {
        self.bindings.push((name.into(), word));
    }
}

/// Memory manager that records every request
pub struct FakeMemory {
    pub ram_size: u64,
    pub registered: Vec<(Phandle, Phandle)>,
    pub claimed_phys: Vec<(u32, u32)>,
    pub claimed_virt: Vec<(u32, u32)>,
    pub maps: Vec<(u32, u32, u32, u32)>,
    pub refuse_alloc: bool,
    pub refuse_claims: bool,
    next_alloc: u32,
}

impl FakeMemory {
    pub fn new(ram_size: u64) -> Self {
        Self {
            ram_size,
            registered: Vec::new(),
            claimed_phys: Vec::new(),
            claimed_virt: Vec::new(),
            maps: Vec::new(),
            refuse_alloc: false,
            refuse_claims: false,
            next_alloc: 0x0100_0000,
        }
    }
}

impl MemoryManager for FakeMemory {
    fn ram_size(&self) -> u64 {
        self.ram_size
    }

    fn register(&mut self, memory: Phandle, cpu: Phandle) {
        self.registered.push((memory, cpu));
    }

    fn alloc_aligned(&mut self, size: u32, align: u32) -> Option<u32> {
        if self.refuse_alloc {
            return None;
        }
        let addr = (self.next_alloc + align - 1) & !(align - 1);
        self.next_alloc = addr + size;
        Some(addr)
    }

    fn claim_phys(&mut self, base: u32, size: u32) -> bool {
        if self.refuse_claims {
            return false;
        }
        self.claimed_phys.push((base, size));
        true
    }

    fn claim_virt(&mut self, base: u32, size: u32) -> bool {
        if self.refuse_claims {
            return false;
        }
        self.claimed_virt.push((base, size));
        true
    }

    fn map(&mut self, phys: u32, virt: u32, size: u32, mode: u32) {
        self.maps.push((phys, virt, size, mode));
    }
}

/// A window of RAM starting at `base`
pub struct FakeRam {
    base: u32,
    bytes: Vec<u8>,
}

impl FakeRam {
    pub fn new(base: u32, len: usize) -> Self {
        Self {
            base,
            bytes: vec![0; len],
        }
    }

    pub fn load(&mut self, addr: u32, data: &[u8]) {
        let start = (addr - self.base) as usize;
        self.bytes[start..start + data.len()].copy_from_slice(data);
    }

    pub fn read_be32(&self, addr: u32) -> u32 {
        let start = (addr - self.base) as usize;
        u32::from_be_bytes(self.bytes[start..start + 4].try_into().unwrap())
    }

    fn range(&self, addr: u32, len: u32) -> Option<std::ops::Range<usize>> {
        let start = addr.checked_sub(self.base)? as usize;
        let end = start.checked_add(len as usize)?;
        (end <= self.bytes.len()).then_some(start..end)
    }
}

impl PhysMemory for FakeRam {
    fn bytes(&self, addr: u32, len: u32) -> Option<&[u8]> {
        let range = self.range(addr, len)?;
        Some(&self.bytes[range])
    }

    fn bytes_mut(&mut self, addr: u32, len: u32) -> Option<&mut [u8]> {
        let range = self.range(addr, len)?;
        Some(&mut self.bytes[range])
    }
}

/// Board that logs driver calls and captures console output
#[derive(Default)]
pub struct FakeBoard {
    pub calls: Vec<String>,
    pub output: String,
    pub fail_writes: bool,
}

impl fmt::Write for FakeBoard {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.fail_writes {
            return Err(fmt::Error);
        }
        self.output.push_str(s);
        Ok(())
    }
}

impl Board for FakeBoard {
    fn openbios_init(&mut self) {
        self.calls.push("openbios_init".into());
    }

    fn modules_init(&mut self) {
        self.calls.push("modules_init".into());
    }

    fn setup_timers(&mut self) {
        self.calls.push("setup_timers".into());
    }

    fn setup_video(&mut self) {
        self.calls.push("setup_video".into());
    }

    fn init_video_interface(&mut self, path: &str, xfb: u32, fb: u32) {
        self.calls.push(format!("vi {path} {xfb:#x} {fb:#x}"));
    }

    fn init_ohci(&mut self, path: &str, reg: u32) {
        self.calls.push(format!("ohci {path} {reg:#x}"));
    }

    fn init_sdhc(&mut self, path: &str, reg: u32) {
        self.calls.push(format!("sdhc {path} {reg:#x}"));
    }

    fn flush_dcache_range(&mut self, start: u32, end: u32) {
        self.calls.push(format!("dcache {start:#x}..{end:#x}"));
    }

    fn flush_icache_range(&mut self, start: u32, end: u32) {
        self.calls.push(format!("icache {start:#x}..{end:#x}"));
    }

    fn boot(&mut self) {
        self.calls.push("boot".into());
    }
}
