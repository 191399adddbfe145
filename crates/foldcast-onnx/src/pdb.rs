use crate::error::{FoldError, FoldResult};
use anyhow::anyhow;
use ndarray::{ArrayView1, ArrayView3};

// (padded atom name, element) in backbone order, matching the coordinate axis
const BACKBONE_ATOMS: [(&str, &str); 4] = [(" N  ", "N"), (" CA ", "C"), (" C  ", "C"), (" O  ", "O")];

fn three_letter_code(residue: char) -> &'static str {
    match residue.to_ascii_uppercase() {
        'A' => "ALA",
        'R' => "ARG",
        'N' => "ASN",
        'D' => "ASP",
        'C' => "CYS",
        'Q' => "GLN",
        'E' => "GLU",
        'G' => "GLY",
        'H' => "HIS",
        'I' => "ILE",
        'L' => "LEU",
        'K' => "LYS",
        'M' => "MET",
        'F' => "PHE",
        'P' => "PRO",
        'S' => "SER",
        'T' => "THR",
        'W' => "TRP",
        'Y' => "TYR",
        'V' => "VAL",
        _ => "UNK",
    }
}

/// Renders one predicted chain as fixed-column PDB text. `coords` is
/// `[len, 4, 3]` backbone coordinates and `plddt` the per-residue confidence,
/// both padded to at least the sequence length.
pub(crate) fn format_pdb(
    sequence: &str,
    coords: &ArrayView3<f32>,
    plddt: &ArrayView1<f32>,
) -> FoldResult<String> {
    let len = sequence.len();
    if coords.shape()[0] < len || coords.shape()[1] != 4 || coords.shape()[2] != 3 {
        return Err(FoldError::Backend(anyhow!(
            "coordinate array of shape {:?} cannot hold {} residues",
            coords.shape(),
            len
        )));
    }
    if plddt.len() < len {
        return Err(FoldError::Backend(anyhow!(
            "pLDDT array of length {} cannot hold {} residues",
            plddt.len(),
            len
        )));
    }

    let mut pdb = String::new();
    let mut serial = 0usize;
    let mut last_residue = "UNK";
    for (i, residue) in sequence.chars().enumerate() {
        last_residue = three_letter_code(residue);
        for (atom, &(name, element)) in BACKBONE_ATOMS.iter().enumerate() {
            serial += 1;
            pdb.push_str(&format!(
                "ATOM  {:>5} {}{}{:>3} {}{:>4}{}   {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}\n",
                serial,
                name,
                ' ',
                last_residue,
                'A',
                i + 1,
                ' ',
                coords[[i, atom, 0]],
                coords[[i, atom, 1]],
                coords[[i, atom, 2]],
                1.00,
                plddt[i],
                element,
            ));
        }
    }
    pdb.push_str(&format!(
        "TER   {:>5}      {:>3} {}{:>4}\n",
        serial + 1,
        last_residue,
        'A',
        len,
    ));
    pdb.push_str("END\n");
    Ok(pdb)
}
