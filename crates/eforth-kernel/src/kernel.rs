//! The kernel bootstrap.
//!
//! Assembles the complete eForth dictionary into a memory image: user
//! variable proxies, the 64 primitive proxies, derived code words, and the
//! colon-word kernel (number conversion, terminal I/O, the parser, the text
//! interpreter, the compiler, and the debugging tools), followed by the boot
//! vector and the initial user area.
//!
//! The word set and threading follow the classic eForth model; word bodies
//! are cell streams of CFAs with inline literals after `DOLIT`.

use eforth_vm::{Memory, Opcode as Op};

use crate::asm::Assembler;

/// Fixed addresses inside the memory image.
///
/// Baked into the kernel as `DOCON` constants; stable once assembled.
pub mod layout {
    /// Boot vector: a `DOLIST` cell and the CFA of `COLD`.
    pub const BOOT: u32 = 0x00;
    /// Scratch user block.
    pub const HLD: u32 = 0x80;
    pub const SPAN: u32 = 0x84;
    pub const TO_IN: u32 = 0x88;
    pub const NTIB: u32 = 0x8C;
    /// Named user variables.
    pub const TTIB: u32 = 0x90;
    pub const BASE: u32 = 0x94;
    pub const CONTEXT: u32 = 0x98;
    pub const CP: u32 = 0x9C;
    pub const LAST: u32 = 0xA0;
    pub const TEVAL: u32 = 0xA4;
    pub const TABORT: u32 = 0xA8;
    pub const TMP: u32 = 0xAC;
    /// Terminal input buffer.
    pub const TIB: u32 = 0x100;
    pub const TIB_SIZE: u32 = 0x80;
    /// The dictionary grows upward from here.
    pub const DICT: u32 = 0x200;
}

/// IMMEDIATE bit in a header length byte.
const IMEDD: u32 = 0x80;
/// COMPILE-ONLY bit in a header length byte.
const COMPO: u32 = 0x40;

/// Key addresses of an assembled kernel.
#[derive(Debug, Clone, Copy)]
pub struct Kernel {
    /// CFA of `COLD`, the boot word.
    pub cold: u32,
    /// CFA of `QUIT`, the outer interpreter loop.
    pub quit: u32,
    /// CFA of `$INTERPRET` (initial `'EVAL` value).
    pub interpret: u32,
    /// CFA of `$COMPILE`.
    pub compile: u32,
    /// First free dictionary byte after assembly (initial `CP`).
    pub here: u32,
    /// NFA of the last kernel word (initial `LAST`/`CONTEXT`).
    pub last: u32,
}

/// Primitive proxy body: the opcode, then `NEXT` to resume the thread.
fn proxy(op: Op) -> [u8; 4] {
    [op as u8, Op::Next as u8, 0, 0]
}

/// `DOCON` proxy body with an inline constant cell.
fn con(v: i32) -> [u8; 8] {
    let le = v.to_le_bytes();
    [
        Op::DoCon as u8,
        Op::Next as u8,
        0,
        0,
        le[0],
        le[1],
        le[2],
        le[3],
    ]
}

/// `DOCON` fused with a second opcode (`CELL+` is `DOCON 4 +`).
fn con_op(op2: Op, v: i32) -> [u8; 8] {
    let le = v.to_le_bytes();
    [
        Op::DoCon as u8,
        op2 as u8,
        Op::Next as u8,
        0,
        le[0],
        le[1],
        le[2],
        le[3],
    ]
}

/// Assemble the kernel into `mem` and write the boot vector and user area.
pub fn assemble(mem: &mut Memory) -> Kernel {
    let mut asm = Assembler::new(mem, layout::DICT);

    // -- user variable proxies --------------------------------------------

    let hld = asm.code("HLD", &con(layout::HLD as i32));
    let span = asm.code("SPAN", &con(layout::SPAN as i32));
    let inn = asm.code(">IN", &con(layout::TO_IN as i32));
    let ntib = asm.code("#TIB", &con(layout::NTIB as i32));
    let ttib = asm.code("'TIB", &con(layout::TTIB as i32));
    let base = asm.code("BASE", &con(layout::BASE as i32));
    let cntxt = asm.code("CONTEXT", &con(layout::CONTEXT as i32));
    let cpp = asm.code("CP", &con(layout::CP as i32));
    let last = asm.code("LAST", &con(layout::LAST as i32));
    let teval = asm.code("'EVAL", &con(layout::TEVAL as i32));
    let tabrt = asm.code("'ABORT", &con(layout::TABORT as i32));
    let temp = asm.code("tmp", &con(layout::TMP as i32));

    // -- primitive proxies ------------------------------------------------

    let _nop = asm.code("NOP", &[Op::Next as u8, 0, 0, 0]);
    let _bye = asm.code("BYE", &proxy(Op::Bye));
    let qrx = asm.code("?RX", &proxy(Op::QRx));
    let txsto = asm.code("TX!", &proxy(Op::TxStore));
    let _docon = asm.code("DOCON", &proxy(Op::DoCon));
    let dolit = asm.code("DOLIT", &proxy(Op::DoLit));
    let _dolst = asm.code("DOLIST", &proxy(Op::DoList));
    let exit = asm.code("EXIT", &proxy(Op::Exit));
    let execu = asm.code("EXECUTE", &proxy(Op::Execute));
    let donxt = asm.code("DONEXT", &proxy(Op::DoNext));
    let qbran = asm.code("QBRANCH", &proxy(Op::QBranch));
    let bran = asm.code("BRANCH", &proxy(Op::Branch));
    let store = asm.code("!", &proxy(Op::Store));
    let at = asm.code("@", &proxy(Op::At));
    let cstor = asm.code("C!", &proxy(Op::CStore));
    let cat = asm.code("C@", &proxy(Op::CAt));
    let rfrom = asm.code("R>", &proxy(Op::RFrom));
    let rat = asm.code("R@", &proxy(Op::RAt));
    let tor = asm.code(">R", &proxy(Op::ToR));
    let drop = asm.code("DROP", &proxy(Op::Drop));
    let dup = asm.code("DUP", &proxy(Op::Dup));
    let swap = asm.code("SWAP", &proxy(Op::Swap));
    let over = asm.code("OVER", &proxy(Op::Over));
    let zless = asm.code("0<", &proxy(Op::ZLess));
    let and = asm.code("AND", &proxy(Op::And));
    let or = asm.code("OR", &proxy(Op::Or));
    let xor = asm.code("XOR", &proxy(Op::Xor));
    let _uplus = asm.code("UM+", &proxy(Op::UmPlus));
    let _next = asm.code("NEXT", &[Op::Next as u8, Op::Next as u8, 0, 0]);
    let qdup = asm.code("?DUP", &proxy(Op::QDup));
    let _rot = asm.code("ROT", &proxy(Op::Rot));
    let ddrop = asm.code("2DROP", &proxy(Op::DDrop));
    let ddup = asm.code("2DUP", &proxy(Op::DDup));
    let plus = asm.code("+", &proxy(Op::Plus));
    let inver = asm.code("INVERT", &proxy(Op::Invert));
    let negat = asm.code("NEGATE", &proxy(Op::Negate));
    let _dnega = asm.code("DNEGATE", &proxy(Op::DNegate));
    let sub = asm.code("-", &proxy(Op::Sub));
    let abs = asm.code("ABS", &proxy(Op::Abs));
    let equal = asm.code("=", &proxy(Op::Equal));
    let uless = asm.code("U<", &proxy(Op::ULess));
    let less = asm.code("<", &proxy(Op::Less));
    let ummod = asm.code("UM/MOD", &proxy(Op::UmMod));
    let _msmod = asm.code("M/MOD", &proxy(Op::MsMod));
    let _slmod = asm.code("/MOD", &proxy(Op::SlMod));
    let _mod = asm.code("MOD", &proxy(Op::Mod));
    let slash = asm.code("/", &proxy(Op::Slash));
    let _umsta = asm.code("UM*", &proxy(Op::UmStar));
    let star = asm.code("*", &proxy(Op::Star));
    let _mstar = asm.code("M*", &proxy(Op::MStar));
    let _ssmod = asm.code("*/MOD", &proxy(Op::SsMod));
    let _stasl = asm.code("*/", &proxy(Op::StarSlash));
    let _pick = asm.code("PICK", &proxy(Op::Pick));
    let pstor = asm.code("+!", &proxy(Op::PStore));
    let _dstor = asm.code("2!", &proxy(Op::DStore));
    let _dat = asm.code("2@", &proxy(Op::DAt));
    let count = asm.code("COUNT", &proxy(Op::Count));
    let max = asm.code("MAX", &proxy(Op::Max));
    let min = asm.code("MIN", &proxy(Op::Min));

    // -- derived code words -----------------------------------------------

    let blank = asm.code("BL", &con(0x20));
    let _cell = asm.code("CELL", &con(4));
    let cellp = asm.code("CELL+", &con_op(Op::Plus, 4));
    let cellm = asm.code("CELL-", &con_op(Op::Sub, 4));
    let cells = asm.code("CELLS", &con_op(Op::Star, 4));
    let celld = asm.code("CELL/", &con_op(Op::Slash, 4));
    let onep = asm.code("1+", &con_op(Op::Plus, 1));
    let onem = asm.code("1-", &con_op(Op::Sub, 1));
    let _dovar = asm.code("DOVAR", &proxy(Op::DoVar));
    // Clears both stacks at QUIT entry, so ABORT really resets them.
    let preset = asm.code("PRESET", &[Op::SpReset as u8, Op::RpReset as u8, Op::Next as u8, 0]);

    // -- common colon words -----------------------------------------------

    let qkey = asm.colon("?KEY", &[qrx, exit]);
    let key = asm.colon("KEY", &[]);
    asm.begin(&[qkey]);
    asm.until(qbran, &[exit]);
    let emit = asm.colon("EMIT", &[txsto, exit]);
    let withi = asm.colon("WITHIN", &[over, sub, tor, sub, rfrom, uless, exit]);
    let tchar = asm.colon(">CHAR", &[dolit, 0x7F, and, dup, dolit, 0x7F, blank, withi]);
    asm.if_(qbran, &[drop, dolit, 0x5F]);
    asm.then(&[exit]);
    let aligned = asm.colon("ALIGNED", &[dolit, 3, plus, dolit, 0xFFFF_FFFC, and, exit]);
    let here = asm.colon("HERE", &[cpp, at, exit]);
    let pad = asm.colon("PAD", &[here, dolit, 0x50, plus, exit]);
    let tib = asm.colon("TIB", &[ttib, at, exit]);
    let atexe = asm.colon("@EXECUTE", &[at, qdup]);
    asm.if_(qbran, &[execu]);
    asm.then(&[exit]);
    let cmove = asm.colon("CMOVE", &[]);
    asm.for_(tor, &[]);
    asm.aft(bran, &[over, cat, over, cstor, tor, onep, rfrom, onep]);
    asm.then(&[]);
    asm.next(donxt, &[ddrop, exit]);
    let _move = asm.colon("MOVE", &[celld]);
    asm.for_(tor, &[]);
    asm.aft(bran, &[over, at, over, store, tor, cellp, rfrom, cellp]);
    asm.then(&[]);
    asm.next(donxt, &[ddrop, exit]);
    let _fill = asm.colon("FILL", &[swap]);
    asm.for_(tor, &[swap]);
    asm.aft(bran, &[ddup, cstor, onep]);
    asm.then(&[]);
    asm.next(donxt, &[ddrop, exit]);

    // -- number conversion ------------------------------------------------

    let digit = asm.colon(
        "DIGIT",
        &[dolit, 9, over, less, dolit, 7, and, plus, dolit, 0x30, plus, exit],
    );
    let extrc = asm.colon("EXTRACT", &[dolit, 0, swap, ummod, swap, digit, exit]);
    let bdigs = asm.colon("<#", &[pad, hld, store, exit]);
    let hold = asm.colon("HOLD", &[hld, at, onem, dup, hld, store, cstor, exit]);
    let dig = asm.colon("#", &[base, at, extrc, hold, exit]);
    let digs = asm.colon("#S", &[]);
    asm.begin(&[dig, dup]);
    asm.while_(qbran, &[]);
    asm.repeat(bran, &[exit]);
    let sign = asm.colon("SIGN", &[zless]);
    asm.if_(qbran, &[dolit, 0x2D, hold]);
    asm.then(&[exit]);
    let edigs = asm.colon("#>", &[drop, hld, at, pad, over, sub, exit]);
    let strr = asm.colon("str", &[dup, tor, abs, bdigs, digs, rfrom, sign, edigs, exit]);
    let hexx = asm.colon("HEX", &[dolit, 16, base, store, exit]);
    let _decim = asm.colon("DECIMAL", &[dolit, 10, base, store, exit]);
    let upper = asm.colon("wupper", &[dolit, 0x5F5F_5F5F, and, exit]);
    let toupp = asm.colon(">upper", &[dup, dolit, 0x61, dolit, 0x7B, withi]);
    asm.if_(qbran, &[dolit, 0x5F, and]);
    asm.then(&[exit]);
    let digtq = asm.colon(
        "DIGIT?",
        &[tor, toupp, dolit, 0x30, sub, dolit, 9, over, less],
    );
    asm.if_(qbran, &[dolit, 7, sub, dup, dolit, 10, less, or]);
    asm.then(&[dup, rfrom, uless, exit]);
    let numbq = asm.colon(
        "NUMBER?",
        &[base, at, tor, dolit, 0, over, count, over, cat, dolit, 0x24, equal],
    );
    asm.if_(qbran, &[hexx, swap, onep, swap, onem]);
    asm.then(&[over, cat, dolit, 0x2D, equal, tor, swap, rat, sub, swap, rat, plus, qdup]);
    asm.if_(qbran, &[onem]);
    asm.for_(tor, &[dup, tor, cat, base, at, digtq]);
    asm.while_(qbran, &[swap, base, at, star, plus, rfrom, onep]);
    asm.next(donxt, &[drop, rat]);
    asm.if_(qbran, &[negat]);
    asm.then(&[swap]);
    asm.else_(bran, &[rfrom, rfrom, ddrop, ddrop, dolit, 0]);
    asm.then(&[dup]);
    asm.then(&[rfrom, ddrop, rfrom, base, store, exit]);

    // -- terminal output --------------------------------------------------

    let space = asm.colon("SPACE", &[blank, emit, exit]);
    let chars = asm.colon("CHARS", &[swap, dolit, 0, max]);
    asm.for_(tor, &[]);
    asm.aft(bran, &[dup, emit]);
    asm.then(&[]);
    asm.next(donxt, &[drop, exit]);
    let spacs = asm.colon("SPACES", &[blank, chars, exit]);
    let types = asm.colon("TYPE", &[]);
    asm.for_(tor, &[]);
    asm.aft(bran, &[count, tchar, emit]);
    asm.then(&[]);
    asm.next(donxt, &[drop, exit]);
    let cr = asm.colon("CR", &[dolit, 10, dolit, 13, emit, emit, exit]);
    let dostr = asm.colon("do$", &[rfrom, rat, rfrom, count, plus, aligned, tor, swap, tor, exit]);
    let strqp = asm.colon("$\"|", &[dostr, exit]);
    let dotqp = asm.colon(".\"|", &[dostr, count, types, exit]);
    let _dotr = asm.colon(".R", &[tor, strr, rfrom, over, sub, spacs, types, exit]);
    let udotr = asm.colon("U.R", &[tor, bdigs, digs, edigs, rfrom, over, sub, spacs, types, exit]);
    // Digits first, then one trailing space.
    let udot = asm.colon("U.", &[bdigs, digs, edigs, types, space, exit]);
    let dot = asm.colon(".", &[base, at, dolit, 0xA, xor]);
    asm.if_(qbran, &[udot, exit]);
    asm.then(&[strr, types, space, exit]);
    let _quest = asm.colon("?", &[at, dot, exit]);

    // -- parser -----------------------------------------------------------

    let pars = asm.colon("(parse)", &[temp, cstor, over, tor, dup]);
    asm.if_(qbran, &[onem, temp, cat, blank, equal]);
    asm.if_(qbran, &[]);
    asm.for_(tor, &[blank, over, cat, sub, zless, inver]);
    asm.while_(qbran, &[onep]);
    asm.next(donxt, &[rfrom, drop, dolit, 0, dup, exit]);
    asm.then(&[rfrom]);
    asm.then(&[over, swap]);
    asm.for_(tor, &[temp, cat, over, cat, sub, temp, cat, blank, equal]);
    asm.if_(qbran, &[zless]);
    asm.then(&[]);
    asm.while_(qbran, &[onep]);
    asm.next(donxt, &[dup, tor]);
    asm.else_(bran, &[rfrom, drop, dup, onep, tor]);
    asm.then(&[over, sub, rfrom, rfrom, sub, exit]);
    asm.then(&[over, rfrom, sub, exit]);
    let packs = asm.colon(
        "PACK$",
        &[
            dup, tor, ddup, plus, dolit, 0xFFFF_FFFC, and, dolit, 0, swap, store, ddup, cstor,
            onep, swap, cmove, rfrom, exit,
        ],
    );
    let parse = asm.colon(
        "PARSE",
        &[tor, tib, inn, at, plus, ntib, at, inn, at, sub, rfrom, pars, inn, pstor, exit],
    );
    let token = asm.colon(
        "TOKEN",
        &[blank, parse, dolit, 0x1F, min, here, cellp, packs, exit],
    );
    let wordd = asm.colon("WORD", &[parse, here, cellp, packs, exit]);
    let namet = asm.colon("NAME>", &[count, dolit, 0x1F, and, plus, aligned, exit]);
    let sameq = asm.colon("SAME?", &[dolit, 0x1F, and, celld]);
    asm.for_(tor, &[]);
    asm.aft(
        bran,
        &[
            over, rat, cells, plus, at, upper, over, rat, cells, plus, at, upper, sub, qdup,
        ],
    );
    asm.if_(qbran, &[rfrom, drop, exit]);
    asm.then(&[]);
    asm.then(&[]);
    asm.next(donxt, &[dolit, 0, exit]);
    let find = asm.colon(
        "find",
        &[swap, dup, at, temp, store, dup, at, tor, cellp, swap],
    );
    asm.begin(&[at, dup]);
    asm.if_(qbran, &[dup, at, dolit, 0xFFFF_FF3F, and, upper, rat, upper, xor]);
    asm.if_(qbran, &[cellp, dolit, 0xFFFF_FFFF]);
    asm.else_(bran, &[cellp, temp, at, sameq]);
    asm.then(&[]);
    asm.else_(bran, &[rfrom, drop, swap, cellm, swap, exit]);
    asm.then(&[]);
    asm.while_(qbran, &[cellm, cellm]);
    asm.repeat(bran, &[rfrom, drop, swap, drop, cellm, dup, namet, swap, exit]);
    let nameq = asm.colon("NAME?", &[cntxt, find, exit]);

    // -- terminal input ---------------------------------------------------

    let hath = asm.colon("^H", &[tor, over, rfrom, swap, over, xor]);
    asm.if_(qbran, &[dolit, 8, emit, onem, blank, emit, dolit, 8, emit]);
    asm.then(&[exit]);
    let tap = asm.colon("TAP", &[dup, emit, over, cstor, onep, exit]);
    let ktap = asm.colon("kTAP", &[dup, dolit, 0xD, xor, over, dolit, 0xA, xor, and]);
    asm.if_(qbran, &[dolit, 8, xor]);
    asm.if_(qbran, &[blank, tap]);
    asm.else_(bran, &[hath]);
    asm.then(&[exit]);
    asm.then(&[drop, swap, drop, dup, exit]);
    let accep = asm.colon("ACCEPT", &[over, plus, over]);
    asm.begin(&[ddup, xor]);
    asm.while_(qbran, &[key, dup, blank, sub, dolit, 0x5F, uless]);
    asm.if_(qbran, &[tap]);
    asm.else_(bran, &[ktap]);
    asm.then(&[]);
    asm.repeat(bran, &[drop, over, sub, exit]);
    let _expec = asm.colon("EXPECT", &[accep, span, store, drop, exit]);
    let query = asm.colon(
        "QUERY",
        &[
            tib,
            dolit,
            layout::TIB_SIZE,
            accep,
            ntib,
            store,
            drop,
            dolit,
            0,
            inn,
            store,
            exit,
        ],
    );

    // -- text interpreter -------------------------------------------------

    let abort = asm.colon("ABORT", &[tabrt, atexe]);
    let aborq = asm.colon("abort\"", &[]);
    asm.if_(qbran, &[dostr, count, types, abort]);
    asm.then(&[dostr, drop, exit]);
    let error = asm.colon(
        "ERROR",
        &[space, count, types, dolit, 0x3F, emit, dolit, 0x1B, emit, cr, abort],
    );
    let inter = asm.colon("$INTERPRET", &[nameq, qdup]);
    asm.if_(qbran, &[cat, dolit, COMPO, and]);
    asm.str_lit(aborq, " compile only");
    asm.label(&[execu, exit]);
    asm.then(&[numbq]);
    asm.if_(qbran, &[exit]);
    asm.else_(bran, &[error]);
    asm.then(&[]);
    let lbrac = asm.immed("[", &[dolit, inter, teval, store, exit]);
    let dotok = asm.colon(".OK", &[cr, dolit, inter, teval, at, equal]);
    asm.if_(qbran, &[]);
    asm.str_lit(dotqp, " ok>");
    asm.then(&[exit]);
    let eval = asm.colon("EVAL", &[]);
    asm.begin(&[token, dup, at]);
    asm.while_(qbran, &[teval, atexe]);
    asm.repeat(bran, &[drop, dotok, exit]);
    let quit = asm.colon(
        "QUIT",
        &[preset, dolit, layout::TIB, ttib, store, lbrac],
    );
    asm.begin(&[query, eval]);
    asm.again(bran, &[]);

    // -- colon word compiler ----------------------------------------------

    let comma = asm.colon(",", &[here, dup, cellp, cpp, store, store, exit]);
    let liter = asm.immed("LITERAL", &[dolit, dolit, comma, comma, exit]);
    let _allot = asm.colon("ALLOT", &[aligned, cpp, pstor, exit]);
    let strcq = asm.colon(
        "$,\"",
        &[dolit, 0x22, wordd, count, plus, aligned, cpp, store, exit],
    );
    let uniqu = asm.colon("?UNIQUE", &[dup, nameq, qdup]);
    asm.if_(qbran, &[count, dolit, 0x1F, and, space, types]);
    asm.str_lit(dotqp, " reDef");
    asm.then(&[drop, exit]);
    let sname = asm.colon("$,n", &[dup, at]);
    asm.if_(
        qbran,
        &[
            uniqu, dup, namet, cpp, store, dup, last, store, cellm, cntxt, at, swap, store, exit,
        ],
    );
    asm.then(&[error]);
    let tick = asm.colon("'", &[token, nameq]);
    asm.if_(qbran, &[exit]);
    asm.then(&[error]);
    let _bcomp = asm.immed("[COMPILE]", &[tick, comma, exit]);
    let compi = asm.colon("COMPILE", &[rfrom, dup, at, comma, cellp, tor, exit]);
    let scomp = asm.colon("$COMPILE", &[nameq, qdup]);
    asm.if_(qbran, &[at, dolit, IMEDD, and]);
    asm.if_(qbran, &[execu]);
    asm.else_(bran, &[comma]);
    asm.then(&[exit]);
    asm.then(&[numbq]);
    asm.if_(qbran, &[liter, exit]);
    asm.then(&[error]);
    let overt = asm.colon("OVERT", &[last, at, cntxt, store, exit]);
    let rbrac = asm.colon("]", &[dolit, scomp, teval, store, exit]);
    let _colon = asm.colon(
        ":",
        &[token, sname, rbrac, dolit, u32::from(Op::DoList as u8), comma, exit],
    );
    let _semis = asm.immed(";", &[dolit, exit, comma, lbrac, overt, exit]);

    // -- debugging tools --------------------------------------------------

    let dmp = asm.colon("dm+", &[over, dolit, 6, udotr]);
    asm.for_(tor, &[]);
    asm.aft(bran, &[dup, at, dolit, 9, udotr, cellp]);
    asm.then(&[]);
    asm.next(donxt, &[exit]);
    let _dump = asm.colon(
        "DUMP",
        &[base, at, tor, hexx, dolit, 0x1F, plus, dolit, 0x20, slash],
    );
    asm.for_(tor, &[]);
    asm.aft(bran, &[cr, dolit, 8, ddup, dmp, tor, space, cells, types, rfrom]);
    asm.then(&[]);
    asm.next(donxt, &[drop, rfrom, base, store, exit]);
    let _tname = asm.colon(">NAME", &[cntxt]);
    asm.begin(&[at, dup]);
    asm.while_(qbran, &[ddup, namet, xor]);
    asm.if_(qbran, &[cellm]);
    asm.else_(bran, &[swap, drop, exit]);
    asm.then(&[]);
    asm.repeat(bran, &[swap, drop, exit]);
    let dotid = asm.colon(".ID", &[count, dolit, 0x1F, and, types, space, exit]);
    let _words = asm.colon("WORDS", &[cr, cntxt, dolit, 0, temp, store]);
    asm.begin(&[at, qdup]);
    asm.while_(qbran, &[dup, space, dotid, cellm, temp, at, dolit, 0xA, less]);
    asm.if_(qbran, &[dolit, 1, temp, pstor]);
    asm.else_(bran, &[cr, dolit, 0, temp, store]);
    asm.then(&[]);
    asm.repeat(bran, &[exit]);
    let _forgt = asm.colon("FORGET", &[token, nameq, qdup]);
    asm.if_(
        qbran,
        &[cellm, dup, cpp, store, at, dup, cntxt, store, last, store, drop, exit],
    );
    asm.then(&[error]);
    let cold = asm.colon("COLD", &[cr]);
    asm.str_lit(dotqp, "eForth v0.1");
    asm.label(&[cr, quit]);

    // -- structure compiler -----------------------------------------------

    let then_i = asm.immed("THEN", &[here, swap, store, exit]);
    let _for_i = asm.immed("FOR", &[compi, tor, here, exit]);
    let _begin_i = asm.immed("BEGIN", &[here, exit]);
    let _next_i = asm.immed("NEXT", &[compi, donxt, comma, exit]);
    let _until_i = asm.immed("UNTIL", &[compi, qbran, comma, exit]);
    let again_i = asm.immed("AGAIN", &[compi, bran, comma, exit]);
    let if_i = asm.immed("IF", &[compi, qbran, here, dolit, 0, comma, exit]);
    let ahead_i = asm.immed("AHEAD", &[compi, bran, here, dolit, 0, comma, exit]);
    let _repea_i = asm.immed("REPEAT", &[again_i, then_i, exit]);
    let _aft_i = asm.immed("AFT", &[drop, ahead_i, here, swap, exit]);
    let _else_i = asm.immed("ELSE", &[ahead_i, swap, then_i, exit]);
    let _when_i = asm.immed("WHEN", &[if_i, over, exit]);
    let _while_i = asm.immed("WHILE", &[if_i, swap, exit]);
    let _abrtq_i = asm.immed("ABORT\"", &[dolit, aborq, here, store, strcq, exit]);
    let _strq_i = asm.immed("$\"", &[dolit, strqp, here, store, strcq, exit]);
    let _dotq_i = asm.immed(".\"", &[dolit, dotqp, here, store, strcq, exit]);

    let code_w = asm.colon("CODE", &[token, sname, overt, exit]);
    let creat = asm.colon(
        "CREATE",
        &[
            code_w,
            dolit,
            (u32::from(Op::Next as u8) << 8) | u32::from(Op::DoVar as u8),
            comma,
            exit,
        ],
    );
    let _varia = asm.colon("VARIABLE", &[creat, dolit, 0, comma, exit]);
    let _const = asm.colon(
        "CONSTANT",
        &[
            code_w,
            dolit,
            (u32::from(Op::Next as u8) << 8) | u32::from(Op::DoCon as u8),
            comma,
            comma,
            exit,
        ],
    );
    let _dotpr = asm.immed(".(", &[dolit, 0x29, parse, types, exit]);
    let _bksla = asm.immed("\\", &[dolit, 0xA, wordd, drop, exit]);
    let _paren = asm.immed("(", &[dolit, 0x29, parse, ddrop, exit]);
    let _only = asm.colon("COMPILE-ONLY", &[dolit, COMPO, last, at, pstor, exit]);
    let _immed = asm.colon("IMMEDIATE", &[dolit, IMEDD, last, at, pstor, exit]);

    let dict_top = asm.here();
    let last_nfa = asm.last_nfa();

    // -- boot vector and user area ----------------------------------------

    asm.seek(layout::BOOT);
    asm.label(&[u32::from(Op::DoList as u8), cold]);

    asm.seek(layout::TTIB);
    asm.label(&[
        layout::TIB, // 'TIB
        10,          // BASE — decimal cold start
        last_nfa,    // CONTEXT
        dict_top,    // CP
        last_nfa,    // LAST
        inter,       // 'EVAL
        quit,        // 'ABORT
        0,           // tmp
    ]);

    asm.finish();

    Kernel {
        cold,
        quit,
        interpret: inter,
        compile: scomp,
        here: dict_top,
        last: last_nfa,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assembled() -> (Memory, Kernel) {
        let mut mem = Memory::new(0x10000);
        let kernel = assemble(&mut mem);
        (mem, kernel)
    }

    /// Walk the dictionary from `nfa`, returning each entry's NFA.
    fn walk(mem: &Memory, mut nfa: u32) -> Vec<u32> {
        let mut entries = Vec::new();
        while nfa != 0 {
            assert!(entries.len() < 512, "link chain does not terminate");
            entries.push(nfa);
            nfa = mem.cell(nfa - 4) as u32;
        }
        entries
    }

    fn name_at(mem: &Memory, nfa: u32) -> String {
        let len = usize::from(mem.byte(nfa) & 0x1F);
        String::from_utf8_lossy(&mem.slice(nfa + 1, len)).into_owned()
    }

    #[test]
    fn dictionary_chain_is_well_formed() {
        let (mem, kernel) = assembled();
        let entries = walk(&mem, kernel.last);
        // The kernel defines well over a hundred words and the chain ends
        // cleanly at zero.
        assert!(entries.len() > 130, "only {} entries", entries.len());
    }

    #[test]
    fn last_word_is_immediate_marker() {
        let (mem, kernel) = assembled();
        assert_eq!(name_at(&mem, kernel.last), "IMMEDIATE");
    }

    #[test]
    fn expected_vocabulary_is_present() {
        let (mem, kernel) = assembled();
        let names: Vec<String> = walk(&mem, kernel.last)
            .into_iter()
            .map(|nfa| name_at(&mem, nfa))
            .collect();
        for expected in [
            "HLD", "SPAN", ">IN", "#TIB", "'TIB", "BASE", "CONTEXT", "CP", "LAST", "'EVAL",
            "'ABORT", "tmp", "NOP", "BYE", "?RX", "TX!", "EXIT", "EXECUTE", "!", "@", "C!", "C@",
            "R>", "R@", ">R", "DROP", "DUP", "SWAP", "OVER", "0<", "AND", "OR", "XOR", "UM+",
            "?DUP", "ROT", "2DROP", "2DUP", "+", "INVERT", "NEGATE", "DNEGATE", "-", "ABS", "=",
            "U<", "<", "UM/MOD", "M/MOD", "/MOD", "MOD", "/", "UM*", "*", "M*", "*/MOD", "*/",
            "PICK", "+!", "2!", "2@", "COUNT", "MAX", "MIN", "BL", "CELL", "CELL+", "CELLS", "1+",
            "1-", "WITHIN", "ALIGNED", "HERE", "PAD", "TIB", "@EXECUTE", "CMOVE", "MOVE", "FILL",
            "DIGIT", "EXTRACT", "<#", "HOLD", "#", "#S", "SIGN", "#>", "str", "HEX", "DECIMAL",
            "DIGIT?", "NUMBER?", "SPACE", "SPACES", "CHARS", "TYPE", "CR", "do$", ".R", "U.R",
            "U.", ".", "?", "(parse)", "PACK$", "PARSE", "TOKEN", "WORD", "NAME>", "SAME?",
            "find", "NAME?", "^H", "TAP", "kTAP", "ACCEPT", "EXPECT", "QUERY", "ABORT", "ERROR",
            "$INTERPRET", "[", ".OK", "EVAL", "QUIT", ",", "LITERAL", "ALLOT", "$,\"", "?UNIQUE",
            "$,n", "'", "[COMPILE]", "COMPILE", "$COMPILE", "OVERT", "]", ":", ";", "dm+", "DUMP",
            ">NAME", ".ID", "WORDS", "FORGET", "COLD", "THEN", "FOR", "BEGIN", "NEXT", "UNTIL",
            "AGAIN", "IF", "AHEAD", "REPEAT", "AFT", "ELSE", "WHEN", "WHILE", "ABORT\"", "$\"",
            ".\"", "CODE", "CREATE", "VARIABLE", "CONSTANT", ".(", "\\", "(", "COMPILE-ONLY",
            "IMMEDIATE", "KEY", "EMIT", "PRESET",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected:?}");
        }
    }

    #[test]
    fn structure_words_are_immediate() {
        let (mem, kernel) = assembled();
        for nfa in walk(&mem, kernel.last) {
            let name = name_at(&mem, nfa);
            let is_immediate = mem.byte(nfa) & 0x80 != 0;
            let expect_immediate = matches!(
                name.as_str(),
                "[" | "LITERAL"
                    | "[COMPILE]"
                    | ";"
                    | "THEN"
                    | "FOR"
                    | "BEGIN"
                    | "NEXT"
                    | "UNTIL"
                    | "AGAIN"
                    | "IF"
                    | "AHEAD"
                    | "REPEAT"
                    | "AFT"
                    | "ELSE"
                    | "WHEN"
                    | "WHILE"
                    | "ABORT\""
                    | "$\""
                    | ".\""
                    | ".("
                    | "\\"
                    | "("
            );
            assert_eq!(is_immediate, expect_immediate, "flag mismatch on {name:?}");
        }
    }

    #[test]
    fn boot_vector_calls_cold() {
        let (mem, kernel) = assembled();
        assert_eq!(mem.cell(layout::BOOT), i32::from(Op::DoList as u8));
        assert_eq!(mem.cell(layout::BOOT + 4) as u32, kernel.cold);
    }

    #[test]
    fn user_area_image() {
        let (mem, kernel) = assembled();
        assert_eq!(mem.cell(layout::TTIB) as u32, layout::TIB);
        assert_eq!(mem.cell(layout::BASE), 10);
        assert_eq!(mem.cell(layout::CONTEXT) as u32, kernel.last);
        assert_eq!(mem.cell(layout::CP) as u32, kernel.here);
        assert_eq!(mem.cell(layout::LAST) as u32, kernel.last);
        assert_eq!(mem.cell(layout::TEVAL) as u32, kernel.interpret);
        assert_eq!(mem.cell(layout::TABORT) as u32, kernel.quit);
        assert_eq!(mem.cell(layout::TMP), 0);
    }

    #[test]
    fn dictionary_stays_cell_aligned() {
        let (mem, kernel) = assembled();
        assert_eq!(kernel.here & 3, 0);
        for nfa in walk(&mem, kernel.last) {
            // Each code field sits on a cell boundary.
            let len = u32::from(mem.byte(nfa) & 0x1F);
            let cfa = (nfa + 1 + len + 3) & !3;
            assert_eq!(cfa & 3, 0);
            // The link cell before the NFA is aligned too.
            assert_eq!((nfa - 4) & 3, 0);
        }
    }

    #[test]
    fn proxy_words_hold_their_opcode() {
        let (mem, kernel) = assembled();
        for (name, op) in [
            ("DUP", Op::Dup),
            ("DROP", Op::Drop),
            ("SWAP", Op::Swap),
            ("EXIT", Op::Exit),
            ("@", Op::At),
            ("!", Op::Store),
        ] {
            let nfa = walk(&mem, kernel.last)
                .into_iter()
                .find(|&n| name_at(&mem, n) == name)
                .unwrap_or_else(|| panic!("{name} not found"));
            let len = u32::from(mem.byte(nfa) & 0x1F);
            let cfa = (nfa + 1 + len + 3) & !3;
            assert_eq!(mem.byte(cfa), op as u8, "code field of {name}");
            assert_eq!(mem.byte(cfa + 1), Op::Next as u8);
        }
    }

    #[test]
    fn kernel_fits_default_image() {
        let (_, kernel) = assembled();
        assert!(kernel.here > layout::DICT);
        assert!(kernel.here < 0x4000, "kernel unexpectedly large: {:#x}", kernel.here);
    }
}
