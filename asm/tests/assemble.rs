use pgasm::{
    assemble,
    error::Error,
    expr::{parse, Expr},
    literal::LiteralTable,
    object::{Record, Reloc},
    symbol::SymbolTable,
};

macro_rules! case {
    ($($name:ident: $src:expr => $expect:expr,)*) => {
        $(
            #[test]
            fn $name() {
                let (asm, output) = assemble($src);
                let object = output.object.unwrap_or_else(|| panic!("{:?}", asm.msgs));
                assert_eq!(object.to_string(), $expect);
            }
        )*
    }
}

case! {
    end_to_end: ".ORIG x3000\nADD R0,R1,R2\n.END x3000" =>
        "H      30000001\nT30001042\nE3000\n",
    countdown: "\
count .ORIG x3000
        LD   R1, n          ; loop counter
loop    ADD  R1, R1, #-1
        BRP  loop
        HALT
n       .FILL 5
        .END count
" => "\
Hcount 30000005
T30002204
T3001127F
T30020201
T3003F025
T30040005
E3000
",
    relocatable: "\
lib .ORIG
start LEA R0, msg
      PUTS
      RET
msg   .STRZ \"ok\"
ptr   .FILL msg
      .END start
" => "\
Hlib   00000007
T0000E003M0
T0001F022
T0002D000
T0003006F
T0004006B
T00050000
T00060003M1
E0000M1
",
}

#[test]
fn repeated_runs_match() {
    let src = "\
p .ORIG
z .EQU y * 2
y .EQU n - 1
x .BLKW n
n .EQU 3
  LD R0, =z
  LD R1, =y
  LD R2, =-4
  .END
";
    let runs: Vec<String> = (0..5)
        .map(|_| match assemble(src).1.object {
            Some(object) => object.to_string(),
            None => String::new(),
        })
        .collect();
    assert!(!runs[0].is_empty());
    assert!(runs.iter().all(|run| *run == runs[0]));
}

#[test]
fn errors_suppress_object_but_all_are_reported() {
    let (asm, output) = assemble(
        "\
p .ORIG x3000
  ADD R0, R1
  ADD R0, R1, #99
  BR  missing
  .FILL (1 +
  .END
",
    );
    assert!(output.object.is_none());
    let lines: Vec<Option<usize>> = asm.msgs.errors().map(|(_, line)| line).collect();
    assert_eq!(lines.len(), 4);
    for line in [Some(1), Some(2), Some(3), Some(4)] {
        assert!(lines.contains(&line), "{:?}", lines);
    }
}

#[test]
fn length_too_complex() {
    let (asm, output) = assemble("p .ORIG\n.BLKW p * 2\n.END");
    assert!(output.object.is_none());
    assert!(asm
        .msgs
        .errors()
        .any(|(err, _)| matches!(err, Error::LengthTooComplex(_))));
}

#[test]
fn exec_too_complex() {
    let (asm, output) = assemble("p .ORIG\nHALT\n.END p * 3");
    assert!(output.object.is_none());
    assert!(matches!(
        asm.msgs.errors().next(),
        Some((Error::ExecTooComplex(_), Some(2)))
    ));
}

#[test]
fn records_carry_relocation() {
    let (_, output) = assemble("p .ORIG\nhere BR here\nw .FILL here\n.END");
    let object = output.object.unwrap();
    assert_eq!(
        object.0[1],
        Record::Text {
            address: 0,
            word: 0x0E00,
            reloc: Reloc::Page
        }
    );
    assert_eq!(
        object.0[2],
        Record::Text {
            address: 1,
            word: 0,
            reloc: Reloc::Word
        }
    );
    assert!(object.is_relocatable());
}

#[test]
fn simplification_laws() {
    let expr = parse("x+1-(y+2-3)-z-z").unwrap();
    assert_eq!(expr.simplify(&(), false).unwrap().to_string(), "x - y - 2 * z + 2");
    let expr = parse("x+5-(x+5)").unwrap();
    assert_eq!(expr.simplify(&(), false).unwrap(), Expr::Num(0));
}

#[test]
fn precedence() {
    assert_eq!(parse("1+2*4-12%5/3&6^0xA**2**2").unwrap().value(), Some(10000));
    assert_eq!(
        parse("(1+((2*4)-(12))%(5/(((3))&6))^(0xA**2)**2)").unwrap().value(),
        Some(10001)
    );
}

#[test]
fn literal_locations_increase_with_value() {
    let mut pool = LiteralTable::new();
    let values = [300, -5, 7, 300, 0, 7];
    for v in values {
        pool.intern(v);
    }
    pool.fix_start(0x4000);
    let mut sorted: Vec<u16> = values.iter().map(|v| *v as u16).collect();
    sorted.sort();
    sorted.dedup();
    let addrs: Vec<u16> = sorted
        .iter()
        .map(|v| pool.locate(*v as i16).unwrap())
        .collect();
    assert_eq!(addrs, vec![0x4000, 0x4001, 0x4002, 0x4003]);
}

#[test]
fn single_assignment_and_recursion() {
    let mut table = SymbolTable::new();
    assert_eq!(Expr::sym("A").evaluate(&table).ok(), Some(None));
    table.bind("A", Expr::sym("B"), None).unwrap();
    table.bind("B", Expr::sym("A"), None).unwrap();
    assert!(table.bind("A", Expr::Num(1), None).is_err());
    assert!(matches!(
        Expr::sym("A").evaluate(&table),
        Err(Error::Recursion(_))
    ));
    assert!(matches!(
        Expr::sym("B").evaluate(&table),
        Err(Error::Recursion(_))
    ));
}
